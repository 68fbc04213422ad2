use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn atomic_write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("path has no parent"))?;
    fs::create_dir_all(parent)?;
    let tmp_path = parent.join(temp_sibling_name(path));

    {
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    sync_parent_dir(parent)?;
    Ok(())
}

pub fn move_replacing(source: &Path, dest: &Path) -> std::io::Result<PathBuf> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    #[cfg(windows)]
    if dest.exists() {
        fs::remove_file(dest)?;
    }
    fs::rename(source, dest)?;
    Ok(dest.to_path_buf())
}

fn temp_sibling_name(path: &Path) -> String {
    format!(
        ".{}.tmp-{}-{}",
        path.file_name().and_then(|v| v.to_str()).unwrap_or("artifact"),
        std::process::id(),
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    )
}

#[cfg(unix)]
fn sync_parent_dir(parent: &Path) -> std::io::Result<()> {
    fs::File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_parent: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_parent_and_leaves_no_temp_files() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("results/a.result.json");
        atomic_write_file(&target, b"{}").expect("write");
        atomic_write_file(&target, b"{\"v\":2}").expect("overwrite");

        assert_eq!(fs::read_to_string(&target).expect("read"), "{\"v\":2}");
        let names: Vec<_> = fs::read_dir(dir.path().join("results"))
            .expect("list")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn move_replacing_overwrites_existing_destination() {
        let dir = tempdir().expect("tempdir");
        let src = dir.path().join("working/a.job.json");
        let dst = dir.path().join("done/a.job.json");
        fs::create_dir_all(src.parent().expect("parent")).expect("mkdir");
        fs::create_dir_all(dst.parent().expect("parent")).expect("mkdir");
        fs::write(&src, "new").expect("write src");
        fs::write(&dst, "old").expect("write dst");

        move_replacing(&src, &dst).expect("move");
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).expect("read"), "new");
    }
}
