//! 历史记录服务 - 业务能力层
//!
//! 只负责成绩的追加、读取和清空，不关心考试流程

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::HistoryError;
use crate::models::TestResult;

/// 历史记录协作方
///
/// 打开时读取一次已有记录；之后只允许追加或整体清空。
/// `list_all` 按插入顺序倒序返回（最新在前）。
pub trait HistoryStore {
    fn append(&mut self, result: TestResult) -> Result<(), HistoryError>;
    fn list_all(&self) -> &[TestResult];
    fn clear_all(&mut self) -> Result<(), HistoryError>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for Box<T> {
    fn append(&mut self, result: TestResult) -> Result<(), HistoryError> {
        (**self).append(result)
    }

    fn list_all(&self) -> &[TestResult] {
        (**self).list_all()
    }

    fn clear_all(&mut self) -> Result<(), HistoryError> {
        (**self).clear_all()
    }
}

/// 仅保存在内存中的历史记录
#[derive(Debug, Default)]
pub struct MemoryHistory {
    results: Vec<TestResult>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, result: TestResult) -> Result<(), HistoryError> {
        self.results.insert(0, result);
        Ok(())
    }

    fn list_all(&self) -> &[TestResult] {
        &self.results
    }

    fn clear_all(&mut self) -> Result<(), HistoryError> {
        self.results.clear();
        Ok(())
    }
}

/// JSON 文件历史记录
///
/// 文件内容就是 `TestResult` 数组（最新在前），每次追加都整体重写。
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    results: Vec<TestResult>,
}

impl JsonFileHistory {
    /// 打开历史记录文件
    ///
    /// 文件不存在或内容损坏时按空记录处理，不会失败。
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let results = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<TestResult>>(&content) {
                Ok(results) => results,
                Err(e) => {
                    warn!("无法解析历史记录 {}: {}，按空记录处理", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("无法读取历史记录 {}: {}，按空记录处理", path.display(), e);
                Vec::new()
            }
        };

        debug!("已加载 {} 条历史记录: {}", results.len(), path.display());
        Self { path, results }
    }

    fn persist(&self) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(&self.results)?;
        fs::write(&self.path, json).map_err(|source| HistoryError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl HistoryStore for JsonFileHistory {
    fn append(&mut self, result: TestResult) -> Result<(), HistoryError> {
        self.results.insert(0, result);
        if let Err(e) = self.persist() {
            // 写入失败时回滚内存，保持和文件一致
            self.results.remove(0);
            return Err(e);
        }
        Ok(())
    }

    fn list_all(&self) -> &[TestResult] {
        &self.results
    }

    fn clear_all(&mut self) -> Result<(), HistoryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(HistoryError::WriteFailed {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        }
        self.results.clear();
        Ok(())
    }
}
