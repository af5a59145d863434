use std::io::Write as _;

use anyhow::Result;
use dqbot_service::{Session, TurnReply};
use tokio::io::{AsyncBufReadExt as _, BufReader};

use crate::{assertion_store, build_gateway, build_pipeline, open_database, session_prompt};

/// Line-oriented chat on stdin/stdout. Logs go to stderr.
pub(crate) async fn run() -> Result<()> {
    let store = assertion_store();
    let pipeline = build_pipeline(store.clone(), open_database()?);
    let gateway = build_gateway(store, pipeline)?;
    let mut session = Session::new("cli", session_prompt());

    println!("Describe the data quality check you need. Type 'save test' to save it, 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    loop {
        print!("User: ");
        stdout.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match gateway.handle_turn(&mut session, &line).await {
            Ok(TurnReply::Exit) => {
                println!("{}", TurnReply::Exit.message());
                break;
            },
            Ok(reply) => println!("Assistant: {}\n", reply.message()),
            Err(e) => eprintln!("Error: {e}. Please try again."),
        }
    }
    Ok(())
}
