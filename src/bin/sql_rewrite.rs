use anyhow::Context;
use clap::Parser;
use report_sql_migrate::utils::logger;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sql-rewrite")]
#[command(about = "Rewrite a single DB2 SQL statement to PostgreSQL")]
struct Args {
    /// SQL file to convert; reads stdin when omitted
    input: Option<PathBuf>,

    /// Pretty-print the converted SQL
    #[arg(long)]
    format: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let sql = match &args.input {
        Some(path) => {
            tracing::debug!("📄 Reading SQL from {}", path.display());
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("cannot read '{}'", path.display()))?
        }
        None => {
            let mut sql = String::new();
            std::io::stdin()
                .read_to_string(&mut sql)
                .context("cannot read SQL from stdin")?;
            sql
        }
    };

    let converted = report_sql_migrate::convert(sql.trim(), args.format);
    if converted == sql.trim() {
        tracing::debug!("Nothing to rewrite");
    }

    println!("{}", converted);
    Ok(())
}
