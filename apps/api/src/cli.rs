//! Command-line surface
//!
//! Every subcommand except `serve` maps onto one coordinator call and prints
//! its result as pretty JSON on stdout. Failures are reported by `main`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::DATA_DIR_ENV;
use crate::coordination::Coordinator;
use crate::domain::agent::NewAgent;
use crate::domain::event::EventQuery;
use crate::domain::workstream::{NewTask, NewWorkstream};

/// Shared coordination board for cooperating agents
#[derive(Debug, Parser)]
#[command(name = "crewboard")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base directory for board state (overrides the config default)
    #[arg(long, global = true, env = DATA_DIR_ENV, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show an overview of the whole board
    Status {
        /// Print the raw snapshot instead of text
        #[arg(long)]
        json: bool,
    },
    /// Create and list workstreams
    Workstream {
        #[command(subcommand)]
        command: WorkstreamCommand,
    },
    /// Add, claim and complete tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Register agents and record heartbeats
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },
    /// Acquire and release resource leases
    Lock {
        #[command(subcommand)]
        command: LockCommand,
    },
    /// Shared notes between agents
    Knowledge {
        #[command(subcommand)]
        command: KnowledgeCommand,
    },
    /// Append an event to the journal
    Log {
        agent: String,
        action: String,
        /// JSON payload merged into the event
        #[arg(long)]
        data: Option<String>,
    },
    /// Query the journal
    Events {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        action: Option<String>,
        /// Only events at or after this RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Only the final N matches
        #[arg(long)]
        last: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
pub enum WorkstreamCommand {
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Lower is more urgent
        #[arg(long)]
        priority: Option<i64>,
    },
    List,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    Add {
        workstream: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<i64>,
        #[arg(long)]
        estimate: Option<String>,
    },
    List {
        workstream: String,
    },
    Claim {
        workstream: String,
        id: String,
        #[arg(long)]
        agent: String,
    },
    Complete {
        workstream: String,
        id: String,
        /// Result, stored as JSON when it parses as JSON
        #[arg(long)]
        result: Option<String>,
    },
    /// Claim the most urgent pending task
    Next {
        workstream: String,
        #[arg(long)]
        agent: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum AgentCommand {
    Register {
        id: String,
        #[arg(long = "type")]
        agent_type: Option<String>,
        #[arg(long = "capability")]
        capabilities: Vec<String>,
    },
    Heartbeat {
        id: String,
    },
    List,
}

#[derive(Debug, Subcommand)]
pub enum LockCommand {
    /// Exits non-zero when another agent holds the lease
    Acquire {
        resource: String,
        #[arg(long)]
        agent: String,
        #[arg(long)]
        ttl_ms: Option<u64>,
    },
    /// Exits non-zero when the agent did not hold the lease
    Release {
        resource: String,
        #[arg(long)]
        agent: String,
    },
    List,
    /// Drop expired leases from the state document
    Prune,
}

#[derive(Debug, Subcommand)]
pub enum KnowledgeCommand {
    Write {
        topic: String,
        #[arg(long)]
        agent: String,
        #[command(flatten)]
        source: NoteSource,
    },
    Read {
        topic: String,
    },
    Delete {
        topic: String,
        #[arg(long)]
        agent: String,
    },
    List,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct NoteSource {
    /// Note body
    #[arg(long)]
    content: Option<String>,
    /// Read the note body from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl NoteSource {
    async fn read(self) -> Result<String> {
        match (self.content, self.file) {
            (Some(content), _) => Ok(content),
            (None, Some(path)) => tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            (None, None) => bail!("Either --content or --file is required"),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Task results are kept as JSON when they parse, otherwise as a plain string
fn parse_result(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// Runs a one-shot command. `serve` is handled by the binary.
pub async fn execute(command: Commands, coordinator: &Coordinator) -> Result<ExitCode> {
    match command {
        Commands::Serve { .. } => bail!("serve is not a one-shot command"),
        Commands::Status { json } => {
            let snapshot = coordinator.status().await?;
            if json {
                print_json(&snapshot)?;
            } else {
                print!("{}", snapshot.render_text());
            }
        }
        Commands::Workstream { command } => workstream(command, coordinator).await?,
        Commands::Task { command } => task(command, coordinator).await?,
        Commands::Agent { command } => agent(command, coordinator).await?,
        Commands::Lock { command } => {
            if !lock(command, coordinator).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Knowledge { command } => return knowledge(command, coordinator).await,
        Commands::Log {
            agent,
            action,
            data,
        } => {
            let data = match data {
                Some(raw) => serde_json::from_str(&raw).context("--data must be valid JSON")?,
                None => Value::Null,
            };
            print_json(&coordinator.log_event(&agent, &action, data).await?)?;
        }
        Commands::Events {
            agent,
            action,
            since,
            last,
        } => {
            let query = EventQuery {
                agent,
                action,
                since,
                last,
            };
            print_json(&coordinator.query_events(&query).await?)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn workstream(command: WorkstreamCommand, coordinator: &Coordinator) -> Result<()> {
    match command {
        WorkstreamCommand::Create {
            name,
            description,
            priority,
        } => {
            let draft = NewWorkstream {
                description,
                priority,
            };
            print_json(&coordinator.create_workstream(&name, draft).await?)
        }
        WorkstreamCommand::List => print_json(&coordinator.list_workstreams().await?),
    }
}

async fn task(command: TaskCommand, coordinator: &Coordinator) -> Result<()> {
    match command {
        TaskCommand::Add {
            workstream,
            title,
            description,
            priority,
            estimate,
        } => {
            let draft = NewTask {
                title,
                description,
                priority,
                estimate,
            };
            print_json(&coordinator.add_task(&workstream, draft).await?)
        }
        TaskCommand::List { workstream } => print_json(&coordinator.list_tasks(&workstream).await?),
        TaskCommand::Claim {
            workstream,
            id,
            agent,
        } => print_json(&coordinator.claim_task(&workstream, &id, &agent).await?),
        TaskCommand::Complete {
            workstream,
            id,
            result,
        } => {
            let result = result.map(parse_result);
            print_json(&coordinator.complete_task(&workstream, &id, result).await?)
        }
        TaskCommand::Next { workstream, agent } => {
            print_json(&coordinator.next_task(&workstream, &agent).await?)
        }
    }
}

async fn agent(command: AgentCommand, coordinator: &Coordinator) -> Result<()> {
    match command {
        AgentCommand::Register {
            id,
            agent_type,
            capabilities,
        } => {
            let draft = NewAgent {
                agent_type,
                capabilities,
            };
            print_json(&coordinator.register_agent(&id, draft).await?)
        }
        AgentCommand::Heartbeat { id } => {
            let found = coordinator.heartbeat(&id).await?;
            print_json(&serde_json::json!({ "found": found }))
        }
        AgentCommand::List => print_json(&coordinator.list_agents().await?),
    }
}

/// Returns whether the requested lease change happened
async fn lock(command: LockCommand, coordinator: &Coordinator) -> Result<bool> {
    let granted = match command {
        LockCommand::Acquire {
            resource,
            agent,
            ttl_ms,
        } => {
            let outcome = coordinator.acquire_lock(&resource, &agent, ttl_ms).await?;
            print_json(&serde_json::json!({
                "acquired": outcome.is_acquired(),
                "lock": outcome.lock(),
            }))?;
            outcome.is_acquired()
        }
        LockCommand::Release { resource, agent } => {
            let released = coordinator.release_lock(&resource, &agent).await?;
            print_json(&serde_json::json!({ "released": released }))?;
            released
        }
        LockCommand::List => {
            print_json(&coordinator.list_locks().await?)?;
            true
        }
        LockCommand::Prune => {
            let pruned = coordinator.prune_expired_locks().await?;
            print_json(&serde_json::json!({ "pruned": pruned }))?;
            true
        }
    };
    Ok(granted)
}

async fn knowledge(command: KnowledgeCommand, coordinator: &Coordinator) -> Result<ExitCode> {
    match command {
        KnowledgeCommand::Write {
            topic,
            agent,
            source,
        } => {
            let content = source.read().await?;
            print_json(&coordinator.write_knowledge(&topic, &content, &agent).await?)?;
        }
        KnowledgeCommand::Read { topic } => match coordinator.read_knowledge(&topic).await? {
            Some(note) => print!("{}", note.content),
            None => {
                eprintln!("No knowledge recorded for topic {}", topic);
                return Ok(ExitCode::FAILURE);
            }
        },
        KnowledgeCommand::Delete { topic, agent } => {
            let deleted = coordinator.delete_knowledge(&topic, &agent).await?;
            print_json(&serde_json::json!({ "deleted": deleted }))?;
        }
        KnowledgeCommand::List => {
            let mut topics = coordinator.list_knowledge().await?;
            topics.sort();
            print_json(&topics)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_task_command() {
        let cli = Cli::try_parse_from([
            "crewboard", "--data-dir", "/tmp/b", "task", "claim", "w", "abcd1234", "--agent", "a1",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/b")));
        assert!(matches!(
            cli.command,
            Commands::Task {
                command: TaskCommand::Claim { ref agent, .. }
            } if agent == "a1"
        ));
    }

    #[test]
    fn knowledge_write_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["crewboard", "knowledge", "write", "t", "--agent", "a1"]).is_err());
        assert!(Cli::try_parse_from([
            "crewboard", "knowledge", "write", "t", "--agent", "a1", "--content", "x", "--file", "f",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "crewboard", "knowledge", "write", "t", "--agent", "a1", "--content", "x",
        ])
        .is_ok());
    }

    #[test]
    fn events_since_parses_rfc3339() {
        let cli = Cli::try_parse_from([
            "crewboard", "events", "--since", "2024-01-01T00:00:00Z", "--last", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Events { since, last, .. } => {
                assert!(since.is_some());
                assert_eq!(last, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn result_is_json_when_it_parses() {
        assert_eq!(parse_result(r#"{"ok":true}"#.into()), json!({"ok": true}));
        assert_eq!(parse_result("42".into()), json!(42));
        assert_eq!(parse_result("shipped it".into()), json!("shipped it"));
    }

    #[tokio::test]
    async fn denied_lock_exits_non_zero() {
        let temp = tempfile::TempDir::new().unwrap();
        let coordinator = Coordinator::open(temp.path()).await.unwrap();
        coordinator.acquire_lock("repo", "a1", None).await.unwrap();

        let granted = lock(
            LockCommand::Acquire {
                resource: "repo".into(),
                agent: "a2".into(),
                ttl_ms: None,
            },
            &coordinator,
        )
        .await
        .unwrap();
        assert!(!granted);
    }
}
