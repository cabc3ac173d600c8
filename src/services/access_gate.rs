//! 高级权限
//!
//! 支付流程不在本 crate 中，这里只回答"当前是否有权限"。

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{info, warn};

pub trait AccessGate {
    fn has_access(&self) -> bool;
}

/// 固定结果的权限，测试或不收费部署时使用
#[derive(Debug, Clone, Copy)]
pub struct StaticAccess(pub bool);

impl AccessGate for StaticAccess {
    fn has_access(&self) -> bool {
        self.0
    }
}

/// 文件标记的权限：文件内容为 `true` 表示已授权
#[derive(Debug)]
pub struct FileAccessGate {
    path: PathBuf,
    granted: bool,
}

impl FileAccessGate {
    /// 打开时读取一次标记
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let granted = match fs::read_to_string(&path) {
            Ok(content) => content.trim() == "true",
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("无法读取权限标记 {}: {}，按无权限处理", path.display(), e);
                false
            }
        };
        Self { path, granted }
    }

    /// 授予权限并写入标记文件
    pub fn grant(&mut self) -> std::io::Result<()> {
        fs::write(&self.path, "true").map_err(|e| {
            warn!("无法写入权限标记 {}: {}", self.path.display(), e);
            e
        })?;
        self.granted = true;
        info!("✓ 已授予高级权限");
        Ok(())
    }
}

impl AccessGate for FileAccessGate {
    fn has_access(&self) -> bool {
        self.granted
    }
}
