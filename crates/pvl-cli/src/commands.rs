use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use pvl_ledger::{AuditReport, ChainReport, LedgerStats};
use pvl_server::{PvlServer, ServerConfig};
use pvl_service::{ServiceConfig, ServiceError, Traceability, TransitionCommand};
use pvl_types::{Actor, ActorId, ActorRegistration, Batch, BatchDetails, LedgerEntry};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let data_dir = cli.data_dir;
    if let Command::Serve(args) = cli.command {
        return cmd_serve(args, data_dir);
    }

    let data_dir = data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let pvl = Traceability::open_durable(&data_dir, ServiceConfig::default())
        .with_context(|| format!("opening ledger in {}", data_dir.display()))?;
    execute(&pvl, cli.command, format)
}

/// Run a ledger command against an open set of services.
pub fn execute(pvl: &Traceability, command: Command, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Command::Actor(ActorCommand::Register(args)) => cmd_actor_register(pvl, args, format),
        Command::Actor(ActorCommand::List) => cmd_actor_list(pvl, format),
        Command::Actor(ActorCommand::Show { actor }) => {
            let actor = resolve_actor(pvl, &actor)?;
            emit(format, &actor, || print_actor(&actor))
        }
        Command::Batch(BatchCommand::Create(args)) => cmd_batch_create(pvl, args, format),
        Command::Batch(BatchCommand::Show { batch }) => {
            let batch = pvl.queries().get_batch(&batch)?;
            emit(format, &batch, || print_batch(&batch))
        }
        Command::Batch(BatchCommand::List { owner }) => cmd_batch_list(pvl, owner, format),
        Command::Transition(args) => cmd_transition(pvl, args, format),
        Command::History(args) => cmd_history(pvl, args, format),
        Command::Verify(args) => cmd_verify(pvl, args, format),
        Command::Stats => {
            let stats = pvl.queries().stats()?;
            emit(format, &stats, || print_stats(&stats))
        }
        Command::Serve(_) => anyhow::bail!("serve cannot run against an open ledger"),
    }
}

fn cmd_actor_register(pvl: &Traceability, args: RegisterArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut registration = ActorRegistration::new(args.name, args.role);
    registration.external_identity = args.identity;
    registration.location = args.location;
    let actor = pvl.directory().register(registration)?;
    emit(format, &actor, || {
        println!("{} Registered {}", "✓".green().bold(), actor.display_name.bold());
        print_actor(&actor);
    })
}

fn cmd_actor_list(pvl: &Traceability, format: OutputFormat) -> anyhow::Result<()> {
    let actors = pvl.directory().list()?;
    emit(format, &actors, || {
        if actors.is_empty() {
            println!("No actors registered.");
        }
        for actor in &actors {
            println!(
                "{}  {:<18} {}",
                actor.id.to_string().dimmed(),
                actor.role.to_string().cyan(),
                actor.display_name
            );
        }
    })
}

fn cmd_batch_create(pvl: &Traceability, args: CreateBatchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let owner = resolve_actor(pvl, &args.owner)?;
    let details = BatchDetails {
        name: args.name,
        category: args.category,
        origin_location: args.origin,
        produced_on: args.produced_on,
        quantity: args.quantity,
        unit: args.unit,
        unit_price: args.unit_price,
    };
    let batch = pvl.transitions().create_batch(&owner.id, details, args.notes)?;
    emit(format, &batch, || {
        println!("{} Created batch {}", "✓".green().bold(), batch.lookup_key.to_string().yellow().bold());
        print_batch(&batch);
    })
}

fn cmd_batch_list(pvl: &Traceability, owner: Option<String>, format: OutputFormat) -> anyhow::Result<()> {
    let batches = match owner {
        Some(owner) => {
            let owner = resolve_actor(pvl, &owner)?;
            pvl.queries().list_by_owner(&owner.id)?
        }
        None => pvl.queries().list_all()?,
    };
    emit(format, &batches, || {
        if batches.is_empty() {
            println!("No batches.");
        }
        for batch in &batches {
            println!(
                "{:<38} {:<12} {}",
                batch.lookup_key.to_string().yellow(),
                batch.status.to_string().cyan(),
                batch.details.name
            );
        }
    })
}

fn cmd_transition(pvl: &Traceability, args: TransitionArgs, format: OutputFormat) -> anyhow::Result<()> {
    let actor = resolve_actor(pvl, &args.actor)?;
    let batch = pvl.queries().get_batch(&args.batch)?;
    let command = TransitionCommand {
        batch_id: batch.id,
        requested_status: args.status,
        actor_id: actor.id,
        notes: args.notes,
        location: args.location,
    };
    let entry = pvl.transitions().transition(command)?;
    emit(format, &entry, || {
        println!(
            "{} {} {} → {}",
            "✓".green().bold(),
            batch.lookup_key.to_string().yellow(),
            batch.status,
            args.status.to_string().green().bold()
        );
        print_entry(&entry);
    })
}

fn cmd_history(pvl: &Traceability, args: HistoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let batch = pvl.queries().get_batch(&args.batch)?;
    let entries = pvl.queries().get_history(&batch.id)?;
    emit(format, &entries, || {
        println!("{} {} ({})", "Batch".bold(), batch.lookup_key.to_string().yellow(), batch.details.name);
        for entry in &entries {
            print_entry(entry);
        }
    })
}

fn cmd_verify(pvl: &Traceability, args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    match args.batch {
        Some(batch) if !args.all => {
            let batch = pvl.queries().get_batch(&batch)?;
            let report = pvl.queries().verify_chain(&batch.id)?;
            let valid = report.valid;
            emit(format, &report, || print_chain(&batch, &report))?;
            if !valid {
                anyhow::bail!("chain of batch {} is broken", batch.lookup_key);
            }
            Ok(())
        }
        _ => {
            let report = pvl.queries().audit_all()?;
            emit(format, &report, || print_audit(pvl, &report))?;
            if !report.is_clean() {
                anyhow::bail!("ledger audit found problems");
            }
            Ok(())
        }
    }
}

fn cmd_serve(args: ServeArgs, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if data_dir.is_some() {
        config.data_dir = data_dir;
    }
    let server = PvlServer::new(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}

/// Find an actor by id or by external identity.
pub fn resolve_actor(pvl: &Traceability, reference: &str) -> Result<Actor, ServiceError> {
    match reference.trim().parse::<ActorId>() {
        Ok(id) => pvl.directory().resolve(&id),
        Err(_) => pvl.directory().resolve_identity(reference),
    }
}

fn emit<T: serde::Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn print_actor(actor: &Actor) {
    println!("  Id: {}", actor.id.to_string().dimmed());
    println!("  Role: {}", actor.role.to_string().cyan());
    if let Some(identity) = &actor.external_identity {
        println!("  Identity: {identity}");
    }
    if let Some(location) = &actor.location {
        println!("  Location: {location}");
    }
    println!("  Registered: {}", actor.registered_at.to_rfc3339());
}

fn print_batch(batch: &Batch) {
    let d = &batch.details;
    println!("  Id: {}", batch.id.to_string().dimmed());
    println!("  Lookup key: {}", batch.lookup_key.to_string().yellow());
    println!("  Product: {} ({})", d.name.bold(), d.category);
    println!("  Origin: {}, produced {}", d.origin_location, d.produced_on);
    println!("  Quantity: {} {} @ {}", d.quantity, d.unit, d.unit_price);
    println!("  Status: {}", batch.status.to_string().green());
}

fn print_entry(entry: &LedgerEntry) {
    println!(
        "  {} {:<9} {:<18} {}  {}",
        format!("#{}", entry.sequence_no).yellow().bold(),
        entry.action.to_string().green(),
        entry.actor_role_at_time.to_string().cyan(),
        entry.timestamp.to_rfc3339().dimmed(),
        entry.entry_hash.short_hex().dimmed()
    );
    println!("      at {}", entry.location);
    if let Some(notes) = &entry.notes {
        println!("      {}", notes.italic());
    }
}

fn print_chain(batch: &Batch, report: &ChainReport) {
    if report.valid {
        println!(
            "{} Chain of {} verified ({} entries)",
            "✓".green().bold(),
            batch.lookup_key.to_string().yellow(),
            report.entry_count
        );
    } else {
        let detail = report
            .violation
            .as_ref()
            .map(|v| v.description.clone())
            .unwrap_or_default();
        println!(
            "{} Chain of {} broken at sequence {}: {}",
            "✗".red().bold(),
            batch.lookup_key.to_string().yellow(),
            report.broken_at_sequence.unwrap_or_default().to_string().red(),
            detail
        );
    }
}

fn print_audit(pvl: &Traceability, report: &AuditReport) {
    let broken: Vec<_> = report.broken_chains().collect();
    println!(
        "Chains: {} checked, {} broken",
        report.chains.len().to_string().bold(),
        if broken.is_empty() { "0".green() } else { broken.len().to_string().red() }
    );
    for chain in broken {
        let label = pvl
            .queries()
            .batch(&chain.batch_id)
            .map(|b| b.lookup_key.to_string())
            .unwrap_or_else(|_| chain.batch_id.to_string());
        println!(
            "  {} {} at sequence {}",
            "✗".red(),
            label.yellow(),
            chain.broken_at_sequence.unwrap_or_default()
        );
    }
    for divergence in &report.divergences {
        println!(
            "  {} batch {} shows {} but its ledger says {}",
            "✗".red(),
            divergence.batch_id,
            divergence.stored_status,
            divergence
                .ledger_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "nothing".into())
        );
    }
    if report.is_clean() {
        println!("{} Ledger integrity verified", "✓".green().bold());
    }
}

fn print_stats(stats: &LedgerStats) {
    println!("{}", "Ledger".bold());
    println!("  Actors: {}", stats.total_actors);
    for (role, count) in &stats.actors_by_role {
        println!("    {:<18} {count}", role.to_string().cyan());
    }
    println!("  Batches: {}", stats.total_batches);
    for (status, count) in &stats.batches_by_status {
        println!("    {:<18} {count}", status.to_string().green());
    }
    println!("  Entries: {}", stats.total_entries);
    println!("  Total value: {}", stats.total_value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pvl_types::{BatchStatus, Role};

    fn run(pvl: &Traceability, args: &[&str]) -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("pvl").chain(args.iter().copied()))?;
        execute(pvl, cli.command, cli.format)
    }

    fn pvl() -> Traceability {
        Traceability::in_memory(ServiceConfig::default()).unwrap()
    }

    #[test]
    fn register_and_resolve_by_identity() {
        let pvl = pvl();
        run(&pvl, &["actor", "register", "--name", "Farm", "--role", "producer", "--identity", "farm@x.com"]).unwrap();
        let actor = resolve_actor(&pvl, "FARM@x.com").unwrap();
        assert_eq!(actor.role, Role::Producer);
        assert_eq!(resolve_actor(&pvl, &actor.id.to_string()).unwrap(), actor);
        assert!(resolve_actor(&pvl, "nobody@x.com").is_err());
    }

    #[test]
    fn lifecycle_through_commands() {
        let pvl = pvl();
        run(&pvl, &["actor", "register", "--name", "Farm", "--role", "farmer", "--identity", "farm@x.com"]).unwrap();
        run(&pvl, &["actor", "register", "--name", "Hub", "--role", "wholesaler", "--identity", "hub@x.com"]).unwrap();
        run(
            &pvl,
            &[
                "--format", "json", "batch", "create", "--owner", "farm@x.com", "--name", "Tomatoes",
                "--category", "Vegetable", "--origin", "California", "--produced-on", "2024-01-15",
                "--quantity", "100", "--unit", "kg",
            ],
        )
        .unwrap();

        let batch = pvl.queries().list_all().unwrap().remove(0);
        let key = batch.lookup_key.to_string();
        run(&pvl, &["transition", &key, "in-transit", "--as", "hub@x.com"]).unwrap();
        assert_eq!(pvl.queries().batch(&batch.id).unwrap().status, BatchStatus::InTransit);

        let err = run(&pvl, &["transition", &key, "verified", "--as", "farm@x.com"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::IllegalTransition(_))
        ));

        run(&pvl, &["history", &key]).unwrap();
        run(&pvl, &["verify", &key]).unwrap();
        run(&pvl, &["verify", "--all"]).unwrap();
        run(&pvl, &["batch", "list", "--owner", "farm@x.com"]).unwrap();
        run(&pvl, &["--format", "json", "stats"]).unwrap();
    }

    #[test]
    fn durable_ledger_persists_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "pvl", "--data-dir", data_dir, "actor", "register", "--name", "Ops", "--role", "admin",
        ])
        .unwrap();
        run_command(cli).unwrap();

        let pvl = Traceability::open_durable(dir.path(), ServiceConfig::default()).unwrap();
        assert_eq!(pvl.directory().list().unwrap()[0].role, Role::Administrator);
    }
}
