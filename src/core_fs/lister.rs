use chrono::{Local, TimeZone};
use filetime::FileTime;
use log::{debug, warn};
use nix::unistd::{Gid, Group, Uid, User};
use std::fs::Metadata;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

const PERMISSION_BITS: [(u32, char); 9] = [
    (0o400, 'r'),
    (0o200, 'w'),
    (0o100, 'x'),
    (0o040, 'r'),
    (0o020, 'w'),
    (0o010, 'x'),
    (0o004, 'r'),
    (0o002, 'w'),
    (0o001, 'x'),
];

fn is_pseudo_entry(name: &str) -> bool {
    name == "." || name == ".."
}

/// Bare listing used by NLST: one name per entry, `.` and `..` excluded.
pub async fn list_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_pseudo_entry(&name) {
            continue;
        }
        names.push(name);
    }

    Ok(names)
}

/// Attribute listing used by LIST, starting with `.` and `..`.
///
/// Entries that cannot be stat'ed are skipped.
pub async fn list_details(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut lines = Vec::new();

    // read_dir never yields the pseudo entries, so describe them directly.
    for name in [".", ".."] {
        match tokio::fs::metadata(dir.join(name)).await {
            Ok(metadata) => lines.push(format_detail_line(name, &metadata)),
            Err(e) => warn!("stat failed for {:?}: {}", dir.join(name), e),
        }
    }

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        // stat, not lstat: symlinks are described by their target
        let metadata = match tokio::fs::metadata(entry.path()).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("stat failed for {:?}: {}", entry.path(), e);
                continue;
            }
        };
        lines.push(format_detail_line(&name, &metadata));
    }

    debug!("Listed {} entries in {:?}", lines.len(), dir);
    Ok(lines)
}

pub fn format_detail_line(name: &str, metadata: &Metadata) -> String {
    format!(
        "{} {} {} \t{}\t{}K\t{}",
        permission_string(metadata.mode(), metadata.is_dir()),
        owner_name(metadata.uid()),
        group_name(metadata.gid()),
        format_mtime(metadata),
        size_kib(metadata.len()),
        name
    )
}

/// Ten character `drwxr-xr-x` style string.
pub fn permission_string(mode: u32, is_dir: bool) -> String {
    let mut perms = String::with_capacity(10);
    perms.push(if is_dir { 'd' } else { '-' });
    for (bit, flag) in PERMISSION_BITS {
        perms.push(if mode & bit != 0 { flag } else { '-' });
    }
    perms
}

/// Size in kibibytes rounded to the nearest integer, ties to even.
pub fn size_kib(len: u64) -> u64 {
    (len as f64 / 1024.0).round_ties_even() as u64
}

fn format_mtime(metadata: &Metadata) -> String {
    let mtime = FileTime::from_last_modification_time(metadata);
    Local
        .timestamp_opt(mtime.unix_seconds(), 0)
        .single()
        .map(|time| time.format("%y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn owner_name(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => String::new(),
    }
}

fn group_name(gid: u32) -> String {
    match Group::from_gid(Gid::from_raw(gid)) {
        Ok(Some(group)) => group.name,
        _ => String::new(),
    }
}
