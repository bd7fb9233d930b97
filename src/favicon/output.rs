//! # 输出落盘模块
//!
//! ## 设计思路
//!
//! 一次请求的所有产物要么全部出现，要么都不出现。
//! 产物先在内存中完整编码，再写成同目录下的唯一临时文件，最后逐个 rename 到目标路径。
//!
//! ## 实现思路
//!
//! - `OutputBatch::push` 只收集 `(目标路径, 字节)`，不触碰磁盘。
//! - `commit` 先创建输出目录并拒绝已被目录占用的目标，再暂存全部临时文件；任一暂存失败时删除已暂存的临时文件。
//! - rename 阶段先把已存在的目标移到备份名，任一 rename 失败时撤销已落盘的目标并还原备份，全部成功后才删除备份。
//! - 临时文件名包含进程号与自增序号，并发写同一目标时不会交错字节（后写者覆盖）。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::FaviconError;

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 待落盘的一组产物。
#[derive(Debug, Default)]
pub struct OutputBatch {
    items: Vec<(PathBuf, Vec<u8>)>,
}

impl OutputBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, destination: PathBuf, bytes: Vec<u8>) {
        self.items.push((destination, bytes));
    }

    /// 原子地写出全部产物，返回目标路径（与 push 顺序一致）。
    pub fn commit(self) -> Result<Vec<PathBuf>, FaviconError> {
        for (destination, _) in &self.items {
            if let Some(parent) = destination.parent() {
                ensure_dir(parent)?;
            }
            if destination.is_dir() {
                return Err(FaviconError::Io(format!(
                    "输出路径 '{}' 已被目录占用",
                    destination.display()
                )));
            }
        }

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.items.len());
        for (destination, bytes) in &self.items {
            match stage_file(destination, bytes) {
                Ok(temp) => staged.push((temp, destination.clone())),
                Err(err) => {
                    discard_staged(&staged);
                    return Err(err);
                }
            }
        }

        promote_all(&staged)
    }
}

/// 已落盘的目标及其原有文件的备份。
struct Promoted {
    destination: PathBuf,
    backup: Option<PathBuf>,
}

/// 将暂存文件逐个 rename 到目标路径；失败时恢复所有目标的原状。
fn promote_all(staged: &[(PathBuf, PathBuf)]) -> Result<Vec<PathBuf>, FaviconError> {
    let mut promoted: Vec<Promoted> = Vec::with_capacity(staged.len());

    for (index, (temp, destination)) in staged.iter().enumerate() {
        let result = backup_existing(destination).and_then(|backup| {
            match fs::rename(temp, destination) {
                Ok(()) => Ok(backup),
                Err(e) => {
                    if let Some(backup) = &backup {
                        restore_backup(backup, destination);
                    }
                    Err(e)
                }
            }
        });

        match result {
            Ok(backup) => {
                log::debug!("💾 已写入 {}", destination.display());
                promoted.push(Promoted {
                    destination: destination.clone(),
                    backup,
                });
            }
            Err(e) => {
                rollback(&promoted);
                discard_staged(&staged[index..]);
                return Err(FaviconError::Io(format!(
                    "无法写入 '{}'：{}",
                    destination.display(),
                    e
                )));
            }
        }
    }

    for item in &promoted {
        if let Some(backup) = &item.backup {
            if let Err(e) = fs::remove_file(backup) {
                log::warn!("⚠️ 清理备份文件失败 {}：{}", backup.display(), e);
            }
        }
    }

    Ok(promoted.into_iter().map(|item| item.destination).collect())
}

/// 目标已存在时移到备份名，返回备份路径。
fn backup_existing(destination: &Path) -> std::io::Result<Option<PathBuf>> {
    if fs::symlink_metadata(destination).is_err() {
        return Ok(None);
    }
    let backup = sibling_path(destination, "bak");
    fs::rename(destination, &backup)?;
    Ok(Some(backup))
}

fn restore_backup(backup: &Path, destination: &Path) {
    if let Err(e) = fs::rename(backup, destination) {
        log::error!(
            "❌ 还原备份失败 {} -> {}：{}",
            backup.display(),
            destination.display(),
            e
        );
    }
}

fn rollback(promoted: &[Promoted]) {
    for item in promoted.iter().rev() {
        match &item.backup {
            Some(backup) => restore_backup(backup, &item.destination),
            None => {
                if let Err(e) = fs::remove_file(&item.destination) {
                    log::warn!("⚠️ 撤销已写入文件失败 {}：{}", item.destination.display(), e);
                }
            }
        }
    }
    if !promoted.is_empty() {
        log::warn!("↩️ 已回滚 {} 个已写入的目标", promoted.len());
    }
}

/// 创建输出目录（已存在时直接返回）。
pub fn ensure_dir(dir: &Path) -> Result<(), FaviconError> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|e| {
        FaviconError::Io(format!("创建输出目录 '{}' 失败：{}", dir.display(), e))
    })?;
    log::info!("📂 已创建输出目录 - 路径: {}", dir.display());
    Ok(())
}

fn sibling_path(destination: &Path, extension: &str) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    destination.with_file_name(format!(
        ".{}.{}.{}.{}",
        file_name,
        std::process::id(),
        sequence,
        extension
    ))
}

fn stage_file(destination: &Path, bytes: &[u8]) -> Result<PathBuf, FaviconError> {
    let temp = sibling_path(destination, "tmp");

    let result = fs::File::create(&temp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(FaviconError::Io(format!(
            "无法写入 '{}'：{}",
            destination.display(),
            e
        )));
    }

    Ok(temp)
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (temp, _) in staged {
        if let Err(e) = fs::remove_file(temp) {
            log::warn!("⚠️ 清理临时文件失败 {}：{}", temp.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "favicon-output-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn commit_creates_missing_directory() {
        let dir = scratch_dir("mkdir").join("nested").join("deeper");
        let mut batch = OutputBatch::new();
        batch.push(dir.join("a.bin"), vec![1, 2, 3]);

        let written = batch.commit().expect("commit should succeed");
        assert_eq!(written, vec![dir.join("a.bin")]);
        assert_eq!(fs::read(dir.join("a.bin")).expect("read back"), vec![1, 2, 3]);
    }

    #[test]
    fn commit_overwrites_and_leaves_no_temp_files() {
        let dir = scratch_dir("overwrite");
        fs::create_dir_all(&dir).expect("create scratch dir");
        fs::write(dir.join("a.bin"), b"old").expect("seed file");

        let mut batch = OutputBatch::new();
        batch.push(dir.join("a.bin"), b"new".to_vec());
        batch.push(dir.join("b.bin"), b"other".to_vec());
        batch.commit().expect("commit should succeed");

        assert_eq!(fs::read(dir.join("a.bin")).expect("read a"), b"new");
        let names: Vec<String> = fs::read_dir(&dir)
            .expect("list dir")
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        assert!(names.iter().all(|name| !name.ends_with(".tmp")), "{names:?}");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn failed_directory_creation_writes_nothing() {
        let dir = scratch_dir("blocked");
        fs::create_dir_all(&dir).expect("create scratch dir");
        let blocker = dir.join("not-a-dir");
        fs::write(&blocker, b"file in the way").expect("seed blocker");

        let mut batch = OutputBatch::new();
        batch.push(dir.join("ok.bin"), vec![0]);
        batch.push(blocker.join("inner.bin"), vec![0]);

        assert!(matches!(batch.commit(), Err(FaviconError::Io(_))));
        assert!(!dir.join("ok.bin").exists());
    }

    fn list_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("list dir")
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn destination_occupied_by_directory_writes_nothing() {
        let dir = scratch_dir("occupied");
        fs::create_dir_all(dir.join("b.bin")).expect("seed directory in the way");
        fs::write(dir.join("a.bin"), b"old").expect("seed file");

        let mut batch = OutputBatch::new();
        batch.push(dir.join("a.bin"), b"new".to_vec());
        batch.push(dir.join("b.bin"), b"other".to_vec());

        assert!(matches!(batch.commit(), Err(FaviconError::Io(_))));
        assert_eq!(fs::read(dir.join("a.bin")).expect("read a"), b"old");
        assert_eq!(list_names(&dir), vec!["a.bin".to_string(), "b.bin".to_string()]);
    }

    #[test]
    fn failed_rename_restores_previous_destinations() {
        let dir = scratch_dir("rollback");
        fs::create_dir_all(&dir).expect("create scratch dir");
        fs::write(dir.join("existing.bin"), b"old").expect("seed file");

        let fresh_temp = dir.join(".fresh.tmp");
        let existing_temp = dir.join(".existing.tmp");
        fs::write(&fresh_temp, b"fresh").expect("stage fresh");
        fs::write(&existing_temp, b"new").expect("stage existing");
        let staged = vec![
            (fresh_temp, dir.join("fresh.bin")),
            (existing_temp, dir.join("existing.bin")),
            (dir.join(".vanished.tmp"), dir.join("last.bin")),
        ];

        assert!(matches!(promote_all(&staged), Err(FaviconError::Io(_))));
        assert_eq!(fs::read(dir.join("existing.bin")).expect("read existing"), b"old");
        assert_eq!(list_names(&dir), vec!["existing.bin".to_string()]);
    }
}
