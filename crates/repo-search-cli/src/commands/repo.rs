//! Local directory management.
//!
//! These commands write to a filesystem-backed directory. They are not
//! supported for remote services.

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};

use repo_search_core::{ActionKind, Did, Handle, Nsid, PROFILE_COLLECTION, RelatedRecord};

use crate::output;

use super::open_directory;

#[derive(Args, Debug)]
pub struct RepoCommand {
    /// Directory URL (must be file://)
    #[arg(long)]
    pub pds: String,

    #[command(subcommand)]
    pub command: RepoSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoSubcommand {
    /// Create a new account
    CreateAccount {
        /// Handle for the new account (e.g., alice.test)
        handle: String,

        /// Account email
        #[arg(long)]
        email: Option<String>,
    },

    /// Change the handle of an account
    Rename { did: String, handle: String },

    /// Write the profile record of an account
    SetProfile {
        did: String,

        #[arg(long)]
        display_name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Record a moderation action against an account
    TakeAction {
        did: String,

        #[arg(long, value_enum, default_value_t = ActionArg::Takedown)]
        action: ActionArg,
    },

    /// Reverse a moderation action
    ReverseAction { id: u64 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ActionArg {
    Takedown,
    Flag,
    Acknowledge,
    Escalate,
}

impl From<ActionArg> for ActionKind {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Takedown => ActionKind::Takedown,
            ActionArg::Flag => ActionKind::Flag,
            ActionArg::Acknowledge => ActionKind::Acknowledge,
            ActionArg::Escalate => ActionKind::Escalate,
        }
    }
}

pub async fn handle(cmd: RepoCommand) -> Result<()> {
    let directory = open_directory(&cmd.pds)?;
    let store = directory.store();

    match cmd.command {
        RepoSubcommand::CreateAccount { handle, email } => {
            let handle = Handle::new(&handle).context("Invalid handle")?;
            let repo = store
                .create_account(&handle, email.as_deref())
                .context("Failed to create account")?;

            output::field("DID", repo.did.as_str());
            output::field("Handle", repo.handle.as_str());
            output::success("Account created");
        }
        RepoSubcommand::Rename { did, handle } => {
            let did = Did::new(did).context("Invalid DID")?;
            let handle = Handle::new(&handle).context("Invalid handle")?;
            store
                .update_handle(&did, &handle)
                .context("Failed to rename account")?;

            output::success(&format!("{} is now {}", did, handle));
        }
        RepoSubcommand::SetProfile {
            did,
            display_name,
            description,
        } => {
            let did = Did::new(did).context("Invalid DID")?;
            let record = RelatedRecord {
                record_type: PROFILE_COLLECTION.to_string(),
                display_name,
                description,
                avatar: None,
            };
            let collection = Nsid::new(PROFILE_COLLECTION)?;
            store
                .put_record(&did, &collection, "self", &record.to_value()?)
                .context("Failed to write profile")?;

            output::success("Profile updated");
        }
        RepoSubcommand::TakeAction { did, action } => {
            let did = Did::new(did).context("Invalid DID")?;
            let action = store
                .take_action(&did, action.into())
                .context("Failed to take action")?;

            output::field("ID", &action.id.to_string());
            output::success("Action recorded");
        }
        RepoSubcommand::ReverseAction { id } => {
            store
                .reverse_action(id)
                .context("Failed to reverse action")?;

            output::success(&format!("Action {} reversed", id));
        }
    }

    Ok(())
}
