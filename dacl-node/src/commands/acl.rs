//! # ACL Commands
//!
//! - `dacl status` - Show whether an ACL is provisioned
//! - `dacl show` - Print the stored ACL
//! - `dacl message store --file <acl.json>` - Message to sign for storing
//! - `dacl message clear` - Message to sign for clearing
//! - `dacl store --file <acl.json> --signature <b58>` - Store a signed ACL
//! - `dacl clear [--signature <b58>]` - Clear the ACL

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use dacl_core::{
    acl_path, clear_message, legacy_store_message, store_message, AclGateway, AclRecord,
};
use serde_json::json;

/// Message subcommands
#[derive(Debug, Subcommand)]
pub enum MessageAction {
    /// Message for storing a candidate ACL
    Store {
        /// Candidate ACL (JSON)
        #[arg(long, short)]
        file: PathBuf,
        /// Print the pre-fleet-name message instead
        #[arg(long)]
        legacy: bool,
    },

    /// Message for clearing the stored ACL
    Clear,
}

pub struct AclContext {
    root: PathBuf,
    json: bool,
    gateway: AclGateway,
}

impl AclContext {
    pub fn new(root: PathBuf, json: bool) -> Self {
        Self {
            root,
            json,
            gateway: AclGateway::filesystem(),
        }
    }

    pub fn status(&self) -> anyhow::Result<()> {
        let path = acl_path(&self.root);
        if !self.gateway.exists(&self.root) {
            if self.json {
                println!("{}", json!({ "provisioned": false, "path": path }));
            } else {
                println!("No ACL provisioned at {}", path.display());
            }
            return Ok(());
        }

        let summary = self.gateway.load(&self.root)?.summary();
        if self.json {
            println!(
                "{}",
                json!({ "provisioned": true, "path": path, "summary": summary })
            );
        } else {
            println!("ACL at {}", path.display());
            println!("  Version:  {}", display_or_dash(&summary.version));
            println!("  Fleet:    {}", display_or_dash(&summary.fleet_name));
            println!("  Managers: {}", summary.manager_count);
            println!("  Drivers:  {}", summary.driver_count);
            if summary.manager_count == 0 {
                println!("  Warning: no managers, this ACL can never be changed");
            }
        }
        Ok(())
    }

    pub fn show(&self) -> anyhow::Result<()> {
        let acl = self.gateway.load(&self.root)?;
        println!("{}", serde_json::to_string_pretty(&acl)?);
        Ok(())
    }

    pub fn message(&self, action: MessageAction) -> anyhow::Result<()> {
        let message = match action {
            MessageAction::Store { file, legacy } => {
                let candidate = read_candidate(&file)?;
                if legacy {
                    legacy_store_message(&candidate)?
                } else {
                    store_message(&candidate)?
                }
            }
            MessageAction::Clear => clear_message(&self.gateway.load(&self.root)?)?,
        };

        let message = String::from_utf8(message).context("message is not UTF-8")?;
        if self.json {
            println!("{}", json!({ "message": message }));
        } else {
            println!("{}", message);
        }
        Ok(())
    }

    pub fn store(&self, file: &Path, signature: &str) -> anyhow::Result<()> {
        let candidate = read_candidate(file)?;
        self.gateway
            .store_with_text(&self.root, &candidate, signature)?;
        self.report("stored", &format!("ACL stored at {}", acl_path(&self.root).display()));
        Ok(())
    }

    pub fn clear(&self, signature: &str) -> anyhow::Result<()> {
        let existed = self.gateway.exists(&self.root);
        self.gateway.clear(&self.root, signature)?;
        if existed {
            self.report("cleared", "ACL cleared");
        } else {
            self.report("absent", "No ACL to clear");
        }
        Ok(())
    }

    fn report(&self, status: &str, text: &str) {
        if self.json {
            println!("{}", json!({ "status": status }));
        } else {
            println!("{}", text);
        }
    }
}

fn read_candidate(file: &Path) -> anyhow::Result<AclRecord> {
    let data = std::fs::read(file)
        .with_context(|| format!("Failed to read candidate ACL {}", file.display()))?;
    Ok(AclRecord::from_slice(&data)?)
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
