//! 部署信息：确定当前部署分支，用于选择短链接的基础地址

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// 部署信息接口
#[async_trait]
pub trait DeploymentInfo: Send + Sync {
    /// 当前部署分支名
    async fn current_branch(&self) -> Result<String, String>;
}

/// 通过 `git branch --show-current` 获取分支
pub struct GitBranch {
    work_dir: PathBuf,
}

impl GitBranch {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// 以进程当前目录为工作目录
    pub fn current_dir() -> Result<Self, String> {
        std::env::current_dir()
            .map(Self::new)
            .map_err(|e| format!("无法获取当前目录: {}", e))
    }
}

#[async_trait]
impl DeploymentInfo for GitBranch {
    async fn current_branch(&self) -> Result<String, String> {
        let output = Command::new("git")
            .args(["branch", "--show-current"])
            .current_dir(&self.work_dir)
            .output()
            .await
            .map_err(|e| format!("执行 git 失败: {}", e))?;

        if !output.status.success() {
            return Err(format!(
                "git 返回错误: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("[Deploy] 当前分支: {}", branch);
        Ok(branch)
    }
}

/// 固定分支（配置指定或测试使用）
pub struct FixedBranch(pub String);

#[async_trait]
impl DeploymentInfo for FixedBranch {
    async fn current_branch(&self) -> Result<String, String> {
        Ok(self.0.clone())
    }
}
