//! `askr` entry point

use anyhow::Context;
use askr_answer::render;
use askr_cli::{cli, load_config, telemetry, Backends, SeedFile};
use askr_core::{Question, Role};
use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli::command().get_matches();

    telemetry::init(matches.get_flag("log-json"))?;
    let config = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("ask", args)) => {
            let role = *args.get_one::<Role>("role").context("--role is required")?;
            let user = args
                .get_one::<String>("user")
                .map_or("cli", String::as_str);
            let question = args
                .get_many::<String>("question")
                .context("a question is required")?
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");

            let seed = match args.get_one::<PathBuf>("seed") {
                Some(path) => SeedFile::load(path)?,
                None => SeedFile::default(),
            };
            let orchestrator = Backends::build(&config, &seed)
                .await?
                .into_orchestrator(&config);

            let result = orchestrator
                .respond(&Question::new(question.as_str(), role, user))
                .await;
            let failed = result.is_err();
            let reply = render(result);

            if args.get_flag("json") {
                let report = serde_json::json!({
                    "question": question,
                    "role": role,
                    "userId": user,
                    "answer": reply,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{reply}");
            }

            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Some(("check-config", _)) => {
            print!("{}", config.to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}
