// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/json_lines.rs - 逐行 JSON 读取
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
  fs::File,
  io::{BufRead, BufReader, Lines},
  marker::PhantomData,
  path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;

use super::InputError;

/// 每行一个 JSON 对象的文件，行号从 1 开始
pub struct JsonLines<T> {
  path: PathBuf,
  lines: Lines<BufReader<File>>,
  line: usize,
  _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> JsonLines<T> {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
    let path = path.as_ref().to_path_buf();
    let file = File::open(&path).map_err(|source| InputError::IoError {
      path: path.clone(),
      source,
    })?;

    Ok(Self {
      path,
      lines: BufReader::new(file).lines(),
      line: 0,
      _marker: PhantomData,
    })
  }

  /// 读取整个文件，任何一行出错即失败
  pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<T>, InputError> {
    Self::open(path)?.collect()
  }
}

impl<T: DeserializeOwned> Iterator for JsonLines<T> {
  type Item = Result<T, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    let line = self.lines.next()?;
    self.line += 1;

    let result = match line {
      Ok(line) => serde_json::from_str(line.trim()).map_err(|source| InputError::JsonError {
        path: self.path.clone(),
        line: self.line,
        source,
      }),
      Err(source) => Err(InputError::IoError {
        path: self.path.clone(),
        source,
      }),
    };
    Some(result)
  }
}
