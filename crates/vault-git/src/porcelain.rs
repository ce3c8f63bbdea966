//! Parser for `git status --porcelain=v1 -z`

use vault_fs::VaultPath;

use crate::RepositoryStatus;

/// Two-letter status codes git uses for unmerged paths.
const UNMERGED: [&str; 7] = ["DD", "AU", "UD", "UA", "DU", "AA", "UU"];

/// Parse NUL-separated porcelain v1 output.
///
/// Each record is `XY <path>`. Renames and copies are followed by an extra
/// record holding the original path, which is skipped.
pub fn parse_status(output: &str) -> RepositoryStatus {
    let mut status = RepositoryStatus::default();
    let mut records = output.split('\0').filter(|r| !r.is_empty());

    while let Some(record) = records.next() {
        if record.len() < 4 {
            continue;
        }
        let (code, path) = record.split_at(2);
        let path = VaultPath::new(&path[1..]);

        if UNMERGED.contains(&code) {
            status.conflicted.push(path.clone());
        }
        status.changed.push(path);

        if code.starts_with('R') || code.starts_with('C') {
            records.next();
        }
    }

    status
}
