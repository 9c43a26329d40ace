// 该文件是 Shanan （山南西风） 项目的一部分。
// src/dataset/cache.rs - 评估集缓存
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  fs::{self, File},
  io::{BufReader, BufWriter, Write},
  path::{Path, PathBuf},
};

use tracing::{debug, warn};

use super::{DatasetError, EvaluationRecord};
use crate::{crop::CropNormalizer, input::InputError};

const CACHE_MAGIC: [u8; 8] = *b"SNJCROPS";
const CACHE_VERSION: u32 = 1;
// 防止损坏的头部导致一次性分配过大
const MAX_PREALLOCATED_RECORDS: usize = 1 << 16;

/// 缓存头部，裁剪参数变化时缓存同样视为过期
#[derive(Debug, PartialEq, bincode::Encode, bincode::Decode)]
struct CacheHeader {
  magic: [u8; 8],
  version: u32,
  max_side: u32,
  expand_bits: u64,
  record_count: u64,
}

impl CacheHeader {
  fn new(normalizer: &CropNormalizer, record_count: usize) -> Self {
    Self {
      magic: CACHE_MAGIC,
      version: CACHE_VERSION,
      max_side: normalizer.max_side(),
      expand_bits: normalizer.expand().to_bits(),
      record_count: record_count as u64,
    }
  }

  fn matches(&self, normalizer: &CropNormalizer) -> bool {
    self.magic == CACHE_MAGIC
      && self.version == CACHE_VERSION
      && self.max_side == normalizer.max_side()
      && self.expand_bits == normalizer.expand().to_bits()
  }
}

/// 评估集缓存文件，没有并发写保护
#[derive(Debug, Clone)]
pub struct EvaluationSetCache {
  path: PathBuf,
}

impl EvaluationSetCache {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DatasetError + '_ {
    move |source| DatasetError::CacheIoError {
      path: path.to_path_buf(),
      source,
    }
  }

  fn source_error(path: &Path) -> impl FnOnce(std::io::Error) -> DatasetError + '_ {
    move |source| {
      InputError::IoError {
        path: path.to_path_buf(),
        source,
      }
      .into()
    }
  }

  /// 缓存存在且修改时间不早于 `source` 时为新鲜
  pub fn is_fresh(&self, source: &Path) -> Result<bool, DatasetError> {
    let cache_meta = match fs::metadata(&self.path) {
      Ok(meta) => meta,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
      Err(err) => return Err(Self::io_error(&self.path)(err)),
    };
    let source_meta = fs::metadata(source).map_err(Self::source_error(source))?;

    let cache_time = cache_meta.modified().map_err(Self::io_error(&self.path))?;
    let source_time = source_meta.modified().map_err(Self::source_error(source))?;
    Ok(cache_time >= source_time)
  }

  /// 读取新鲜的缓存；缓存过期、参数不符或已损坏时返回 `None`
  pub fn load_if_fresh(
    &self,
    source: &Path,
    normalizer: &CropNormalizer,
  ) -> Result<Option<Vec<EvaluationRecord>>, DatasetError> {
    if !self.is_fresh(source)? {
      debug!("缓存 {} 不存在或已过期", self.path.display());
      return Ok(None);
    }

    let file = File::open(&self.path).map_err(Self::io_error(&self.path))?;
    let mut reader = BufReader::new(file);
    let config = bincode::config::standard();

    let header: CacheHeader = match bincode::decode_from_std_read(&mut reader, config) {
      Ok(header) => header,
      Err(err) => {
        warn!("缓存头部无法解析, 将重新构建: {}", err);
        return Ok(None);
      }
    };
    if !header.matches(normalizer) {
      warn!("缓存版本或裁剪参数不符, 将重新构建: {:?}", header);
      return Ok(None);
    }

    let count = header.record_count as usize;
    let mut records = Vec::with_capacity(count.min(MAX_PREALLOCATED_RECORDS));
    for i in 0..count {
      match bincode::decode_from_std_read::<EvaluationRecord, _, _>(&mut reader, config) {
        Ok(record) => records.push(record),
        Err(err) => {
          warn!("缓存第 {} 条记录损坏, 将重新构建: {}", i, err);
          return Ok(None);
        }
      }
    }

    Ok(Some(records))
  }

  /// 先写入同目录临时文件，再替换缓存
  pub fn store(
    &self,
    records: &[EvaluationRecord],
    normalizer: &CropNormalizer,
  ) -> Result<(), DatasetError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(Self::io_error(parent))?;
    }

    let tmp_path = self.path.with_extension("tmp");
    let file = File::create(&tmp_path).map_err(Self::io_error(&tmp_path))?;
    let mut writer = BufWriter::new(file);
    let config = bincode::config::standard();

    bincode::encode_into_std_write(
      CacheHeader::new(normalizer, records.len()),
      &mut writer,
      config,
    )?;
    for record in records {
      bincode::encode_into_std_write(record, &mut writer, config)?;
    }
    writer.flush().map_err(Self::io_error(&tmp_path))?;
    drop(writer);

    fs::rename(&tmp_path, &self.path).map_err(Self::io_error(&self.path))?;
    debug!("写入缓存 {}: {} 条记录", self.path.display(), records.len());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::{Duration, SystemTime};

  use image::{Rgb, RgbImage};
  use tempfile::tempdir;

  use crate::{frame::RgbFrame, input::GroundTruth};

  fn records() -> Vec<EvaluationRecord> {
    ["甲", "乙"]
      .iter()
      .enumerate()
      .map(|(i, text)| EvaluationRecord {
        crop: RgbFrame::try_from(RgbImage::from_pixel(3, 3, Rgb([i as u8, 9, 9]))).unwrap(),
        ground_truth: GroundTruth::new(*text),
      })
      .collect()
  }

  fn touch(path: &Path, time: SystemTime) {
    File::options()
      .write(true)
      .open(path)
      .unwrap()
      .set_modified(time)
      .unwrap();
  }

  #[test]
  fn missing_cache_is_not_fresh() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("proposals.jsonl");
    fs::write(&source, "").unwrap();

    let cache = EvaluationSetCache::new(dir.path().join("cache.bin"));
    assert!(!cache.is_fresh(&source).unwrap());
    assert_eq!(
      cache
        .load_if_fresh(&source, &CropNormalizer::default())
        .unwrap(),
      None
    );
  }

  #[test]
  fn missing_source_is_input_error() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("proposals.jsonl");
    let cache = EvaluationSetCache::new(dir.path().join("cache.bin"));
    cache.store(&records(), &CropNormalizer::default()).unwrap();

    let err = cache.is_fresh(&source).unwrap_err();
    assert!(matches!(
      err,
      DatasetError::InputError(InputError::IoError { ref path, .. }) if *path == source
    ));
  }

  #[test]
  fn stored_records_load_back() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("proposals.jsonl");
    fs::write(&source, "").unwrap();
    touch(&source, SystemTime::now() - Duration::from_secs(60));

    let normalizer = CropNormalizer::default();
    let cache = EvaluationSetCache::new(dir.path().join("nested").join("cache.bin"));
    cache.store(&records(), &normalizer).unwrap();

    assert!(!dir.path().join("nested").join("cache.tmp").exists());
    assert_eq!(
      cache.load_if_fresh(&source, &normalizer).unwrap(),
      Some(records())
    );
  }

  #[test]
  fn newer_source_makes_cache_stale() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("proposals.jsonl");
    fs::write(&source, "").unwrap();

    let normalizer = CropNormalizer::default();
    let cache = EvaluationSetCache::new(dir.path().join("cache.bin"));
    cache.store(&records(), &normalizer).unwrap();
    touch(&source, SystemTime::now() + Duration::from_secs(60));

    assert_eq!(cache.load_if_fresh(&source, &normalizer).unwrap(), None);
  }

  #[test]
  fn changed_crop_parameters_invalidate_cache() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("proposals.jsonl");
    fs::write(&source, "").unwrap();
    touch(&source, SystemTime::now() - Duration::from_secs(60));

    let cache = EvaluationSetCache::new(dir.path().join("cache.bin"));
    cache.store(&records(), &CropNormalizer::default()).unwrap();

    let normalizer = CropNormalizer::default().with_max_side(64);
    assert_eq!(cache.load_if_fresh(&source, &normalizer).unwrap(), None);
  }

  #[test]
  fn corrupt_cache_is_rebuilt() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("proposals.jsonl");
    fs::write(&source, "").unwrap();
    touch(&source, SystemTime::now() - Duration::from_secs(60));

    let cache = EvaluationSetCache::new(dir.path().join("cache.bin"));
    fs::write(cache.path(), b"definitely not bincode").unwrap();

    assert_eq!(
      cache
        .load_if_fresh(&source, &CropNormalizer::default())
        .unwrap(),
      None
    );
  }
}
