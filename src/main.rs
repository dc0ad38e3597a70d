use clap::Parser;
use miette::Result;
use plantops::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => plantops::cli::commands::init::run(args),
        Commands::Sync(cmd) => plantops::cli::commands::sync::run(cmd, &global),
        Commands::Stock(cmd) => plantops::cli::commands::stock::run(cmd, &global),
        Commands::Mov(cmd) => plantops::cli::commands::mov::run(cmd, &global),
        Commands::Order(cmd) => plantops::cli::commands::order::run(cmd, &global),
        Commands::Prod(cmd) => plantops::cli::commands::prod::run(cmd, &global),
        Commands::Machine(cmd) => plantops::cli::commands::machine::run(cmd, &global),
        Commands::Completions(args) => plantops::cli::commands::completions::run(args),
    }
}
