//! Moving candidates into the holding directory
//!
//! A move is a rename when source and target share a filesystem. Across
//! filesystems the tree is copied and the source removed afterwards. An
//! existing destination is never overwritten.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::MoveError;

/// Move `source` (a directory or a single file) into `target_root`, keeping
/// its base name. Returns the destination path.
pub async fn move_into(source: &Path, target_root: &Path) -> Result<PathBuf, MoveError> {
    let name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("source has no file name: {}", source.display()),
        )
    })?;
    let dest = target_root.join(name);

    // rename(2) silently replaces an empty directory or a file, so this check
    // is the only guard on that path. It holds because the organizer's run
    // gate keeps a single writer in the target.
    if tokio::fs::try_exists(&dest).await? {
        return Err(MoveError::DestinationExists(dest));
    }

    match tokio::fs::rename(source, &dest).await {
        Ok(()) => Ok(dest),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                source = %source.display(),
                dest = %dest.display(),
                "Rename crosses filesystems, falling back to copy"
            );
            copy_then_remove(source, &dest).await?;
            Ok(dest)
        }
        Err(e) => Err(e.into()),
    }
}

async fn copy_then_remove(source: &Path, dest: &Path) -> Result<(), MoveError> {
    let metadata = tokio::fs::metadata(source).await?;

    // Reserve the destination before copying anything into it. Losing that
    // race is a collision, and the existing entry is not ours to clean up.
    let reserved = if metadata.is_dir() {
        tokio::fs::create_dir(dest).await
    } else {
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
            .map(|_| ())
    };
    if let Err(e) = reserved {
        return Err(match e.kind() {
            io::ErrorKind::AlreadyExists => MoveError::DestinationExists(dest.to_path_buf()),
            _ => e.into(),
        });
    }

    let copied = if metadata.is_dir() {
        copy_dir_contents(source, dest).await
    } else {
        tokio::fs::copy(source, dest).await.map(|_| ())
    };

    if let Err(e) = copied {
        // Leave the source intact and don't strand half a copy in the target
        let cleanup = if metadata.is_dir() {
            tokio::fs::remove_dir_all(dest).await
        } else {
            tokio::fs::remove_file(dest).await
        };
        if let Err(cleanup_err) = cleanup {
            warn!(dest = %dest.display(), error = %cleanup_err, "Failed to remove partial copy");
        }
        return Err(e.into());
    }

    if metadata.is_dir() {
        tokio::fs::remove_dir_all(source).await?;
    } else {
        tokio::fs::remove_file(source).await?;
    }
    Ok(())
}

/// Copy the tree below `source` into the existing, empty directory `dest`.
async fn copy_dir_contents(source: &Path, dest: &Path) -> io::Result<()> {
    let mut entries = tokio::fs::read_dir(source).await?;
    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let file_type = entry.file_type().await?;

        if file_type.is_dir() {
            tokio::fs::create_dir(&dest_path).await?;
            Box::pin(copy_dir_contents(&entry_path, &dest_path)).await?;
        } else if file_type.is_symlink() {
            copy_symlink(&entry_path, &dest_path).await?;
        } else {
            tokio::fs::copy(&entry_path, &dest_path).await?;
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    let link = tokio::fs::read_link(source).await?;
    tokio::fs::symlink(link, dest).await
}

#[cfg(not(unix))]
async fn copy_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    tokio::fs::copy(source, dest).await.map(|_| ())
}
