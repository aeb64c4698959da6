use crate::errors::MnemonicToolError;
use eyre::Context as _;
use rand::Rng as _;
use std::{
    fs::{self, OpenOptions},
    io::Write as _,
    path::{Path, PathBuf},
};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt as _, PermissionsExt as _};

pub const MODE_DIR_PRIVATE: u32 = 0o700;
pub const MODE_FILE_PRIVATE: u32 = 0o600;

fn is_symlink(p: &Path) -> eyre::Result<bool> {
    let md = fs::symlink_metadata(p).with_context(|| format!("stat {}", p.display()))?;
    Ok(md.file_type().is_symlink())
}

pub fn ensure_private_dir(dir: &Path) -> eyre::Result<()> {
    if dir.exists() {
        if is_symlink(dir)? {
            eyre::bail!("refusing to use symlinked directory: {}", dir.display());
        }
        let md = fs::metadata(dir).with_context(|| format!("stat {}", dir.display()))?;
        if !md.is_dir() {
            eyre::bail!("expected directory at {}", dir.display());
        }
    } else {
        fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    }

    // Best-effort: enforce private perms on Unix.
    #[cfg(unix)]
    {
        let md = fs::metadata(dir).with_context(|| format!("stat {}", dir.display()))?;
        let mut mode = md.permissions().mode();
        if (mode & 0o077) != 0 {
            mode = MODE_DIR_PRIVATE;
            fs::set_permissions(dir, fs::Permissions::from_mode(mode))
                .with_context(|| format!("chmod {:o} {}", mode, dir.display()))?;
        }
    }

    Ok(())
}

/// Fail unless `dir` is absent or an empty directory.
///
/// A run never mixes its files with (or silently replaces) files from an earlier run.
pub fn ensure_empty_or_absent(dir: &Path) -> eyre::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    if !dir.is_dir() {
        return Err(MnemonicToolError::Persistence(format!(
            "output path is not a directory: {}",
            dir.display()
        ))
        .into());
    }
    let mut entries = fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))?;
    if entries.next().is_some() {
        return Err(MnemonicToolError::Persistence(format!(
            "output directory is not empty: {}",
            dir.display()
        ))
        .into());
    }
    Ok(())
}

/// Prepare a private directory that will receive secret output files.
pub fn prepare_output_dir(dir: &Path) -> eyre::Result<()> {
    ensure_empty_or_absent(dir)?;
    ensure_private_dir(dir)
}

fn tmp_path_for(parent: &Path, final_name: &Path) -> PathBuf {
    let base = final_name
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let mut rand_bytes = [0_u8; 8];
    rand::rng().fill_bytes(&mut rand_bytes);
    let suffix = hex::encode(rand_bytes);
    parent.join(format!(".{base}.tmp.{suffix}"))
}

/// Write `bytes` to `path` so that readers only ever observe the complete file.
///
/// Data goes to a hidden temp file (created with `mode`), is fsynced, then renamed into
/// place. On failure the temp file is removed.
pub fn write_atomic_restrictive(path: &Path, bytes: &[u8], mode: u32) -> eyre::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| eyre::eyre!("missing parent for {}", path.display()))?;
    ensure_private_dir(parent)?;

    if path.exists() && is_symlink(path)? {
        eyre::bail!("refusing to write to symlink: {}", path.display());
    }

    let tmp = tmp_path_for(parent, path);
    let res = write_new_file(&tmp, bytes, mode).and_then(|()| {
        // `rename` is atomic on Unix. On Windows, this can fail if the destination exists.
        #[cfg(windows)]
        {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("remove existing {}", path.display()))?;
            }
        }
        fs::rename(&tmp, path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))
    });
    if res.is_err() {
        drop(fs::remove_file(&tmp));
    }
    res
}

fn write_new_file(tmp: &Path, bytes: &[u8], mode: u32) -> eyre::Result<()> {
    let mut oo = OpenOptions::new();
    oo.create_new(true).write(true);
    #[cfg(unix)]
    {
        oo.mode(mode);
    }
    #[cfg(not(unix))]
    {
        let _unused_mode = mode;
    }
    let mut f = oo
        .open(tmp)
        .with_context(|| format!("open temp {}", tmp.display()))?;

    f.write_all(bytes)
        .with_context(|| format!("write {}", tmp.display()))?;
    f.flush()
        .with_context(|| format!("flush {}", tmp.display()))?;
    f.sync_all()
        .with_context(|| format!("fsync {}", tmp.display()))?;
    Ok(())
}

pub fn write_string_atomic_restrictive(path: &Path, s: &str, mode: u32) -> eyre::Result<()> {
    write_atomic_restrictive(path, s.as_bytes(), mode)
}

/// Regular, non-hidden files directly inside `dir`, sorted by name.
///
/// Hidden entries are skipped so leftover temp files from an interrupted run are ignored.
pub fn list_visible_files(dir: &Path) -> eyre::Result<Vec<PathBuf>> {
    let mut out = vec![];
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read dir entry in {}", dir.display()))?;
        let hidden = entry.file_name().to_str().is_none_or(|n| n.starts_with('.'));
        if hidden {
            continue;
        }
        let ft = entry
            .file_type()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if ft.is_file() {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}
