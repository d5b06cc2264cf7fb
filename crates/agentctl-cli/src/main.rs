mod commands;
mod logging;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;

use commands::ask::AskArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ask questions about a git repository", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a question about the repository containing the current directory
    Ask(AskArgs),

    /// List the tools the model may call
    Tools {
        /// Include search_files, get_file_info and list_git_files
        #[arg(long)]
        advanced: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask(args) => {
            logging::init(args.verbose);
            commands::ask::execute(args).await
        }
        Command::Tools { advanced } => {
            logging::init(false);
            commands::tools::execute(advanced)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", style("error:").red().bold(), err);
            for cause in err.chain().skip(1) {
                eprintln!("  {} {}", style("caused by:").dim(), cause);
            }
            ExitCode::FAILURE
        }
    }
}
