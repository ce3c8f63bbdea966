//! Status command implementation

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use serde_json::json;
use vault_sync::{Coordinator, Inspection};

use crate::error::{CliError, Result};

/// Run the status command
pub async fn run_status(coordinator: &Arc<Coordinator>, vault: &Path, as_json: bool) -> Result<()> {
    let inspection = coordinator
        .inspect()
        .await
        .map_err(|_| CliError::Reported)?
        .ok_or(CliError::Reported)?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&to_json(&inspection, vault))?
        );
        return Ok(());
    }

    println!("{}", "Vault Status".bold());
    println!();
    println!("{}:    {}", "Vault".dimmed(), vault.display());
    println!("{}:  {}", "Backend".dimmed(), inspection.backend.cyan());
    match &inspection.branch.remote {
        Some(remote) => println!(
            "{}:   {} -> {}",
            "Branch".dimmed(),
            inspection.branch.current.cyan(),
            remote
        ),
        None => println!(
            "{}:   {} ({})",
            "Branch".dimmed(),
            inspection.branch.current.cyan(),
            "no upstream".yellow()
        ),
    }
    println!();

    println!("{}:", "Changed".bold());
    if inspection.status.changed.is_empty() {
        println!("  {}", "Nothing to commit".dimmed());
    } else {
        for path in &inspection.status.changed {
            println!("  {} {}", "~".yellow(), path);
        }
    }

    if !inspection.status.conflicted.is_empty() {
        println!();
        println!("{}:", "Conflicts".bold());
        for path in &inspection.status.conflicted {
            println!("  {} {}", "!".red(), path);
        }
    }
    Ok(())
}

fn to_json(inspection: &Inspection, vault: &Path) -> serde_json::Value {
    let paths = |list: &[vault_fs::VaultPath]| {
        list.iter()
            .map(|p| p.as_str().to_string())
            .collect::<Vec<_>>()
    };
    json!({
        "vault": vault.display().to_string(),
        "backend": inspection.backend,
        "branch": inspection.branch.current,
        "upstream": inspection.branch.remote,
        "changed": paths(&inspection.status.changed),
        "conflicted": paths(&inspection.status.conflicted),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_fs::VaultPath;
    use vault_git::{BranchInfo, RepositoryStatus};

    #[test]
    fn test_json_shape() {
        let inspection = Inspection {
            backend: "git-cli",
            branch: BranchInfo {
                current: "main".to_string(),
                remote: None,
            },
            status: RepositoryStatus {
                changed: vec![VaultPath::new("a.md")],
                conflicted: vec![],
            },
        };

        let value = to_json(&inspection, Path::new("/notes"));

        assert_eq!(value["branch"], "main");
        assert!(value["upstream"].is_null());
        assert_eq!(value["changed"], json!(["a.md"]));
        assert_eq!(value["conflicted"], json!([]));
    }
}
