use anyhow::Result;
use benchmine::cli::{configure_thread_pool, init_logging, parse_args, Commands};
use benchmine::commands::{
    init_config, inspect_file, select_functions, InspectConfig, SelectConfig,
};

fn main() -> Result<()> {
    let cli = parse_args();

    match cli.command {
        Commands::Select {
            methods,
            files,
            output_dir,
            repo,
            since,
            until,
            config,
            allowed_libraries,
            expansion_depth,
            jobs,
            verbosity,
        } => {
            init_logging(verbosity);
            configure_thread_pool(jobs);
            select_functions(SelectConfig {
                methods,
                files,
                output_dir,
                repo,
                since,
                until,
                config,
                allowed_libraries,
                expansion_depth,
            })?;
        }
        Commands::Inspect {
            path,
            config,
            allowed_libraries,
            verbosity,
        } => {
            init_logging(verbosity);
            inspect_file(InspectConfig {
                path,
                config,
                allowed_libraries,
            })?;
        }
        Commands::Init { force } => {
            init_logging(0);
            init_config(&std::env::current_dir()?, force)?;
        }
    }

    Ok(())
}
