use clap::{Arg, ArgMatches, Command};
use std::sync::Arc;

use torum_client::auth::FileStorage;
use torum_client::guard::Navigator;
use torum_client::prelude::*;

struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: &str) {
        println!("-> {}", route);
    }
}

fn cli() -> Command<'static> {
    Command::new("torum")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Command-line client for the TORUM forum")
        .subcommand_required(true)
        .arg(
            Arg::new("session-file")
                .long("session-file")
                .value_name("FILE")
                .help("Where the session is persisted")
                .takes_value(true)
                .global(true)
                .default_value(".torum-session.json"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .help("API server address (overrides TORUM_API_URL)")
                .takes_value(true)
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Log in and persist the session")
                .arg(Arg::new("email").required(true))
                .arg(Arg::new("password").required(true)),
        )
        .subcommand(Command::new("logout").about("End the session"))
        .subcommand(Command::new("whoami").about("Show the logged-in account"))
        .subcommand(Command::new("posts").about("List your posts"))
        .subcommand(
            Command::new("search")
                .about("Search posts and documents")
                .arg(Arg::new("query").required(true).multiple_values(true)),
        )
        .subcommand(
            Command::new("route")
                .about("Check whether a view may be opened")
                .arg(Arg::new("path").required(true)),
        )
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let mut options = ClientOptions::from_env();
    if let Some(url) = matches.value_of("api-url") {
        options = options.with_base_url(url);
    }
    let session_file = matches
        .value_of("session-file")
        .unwrap_or(".torum-session.json");

    let torum = Torum::with_storage(
        options,
        Arc::new(FileStorage::new(session_file)),
        Arc::new(PrintNavigator),
    )?;

    match matches.subcommand() {
        Some(("login", sub)) => {
            let email = sub.value_of("email").unwrap_or_default();
            let password = sub.value_of("password").unwrap_or_default();
            let user = torum.sign_in(email, password).await?;
            println!("logged in as {} ({})", user.username, user.user_role);
        }
        Some(("logout", _)) => {
            torum.sign_out().await;
            println!("logged out");
        }
        Some(("whoami", _)) => match torum.current_user() {
            Some(_) => {
                let user = torum.reload_user().await?;
                println!("{} <{}> {}", user.username, user.email, user.user_role);
            }
            None => println!("not logged in"),
        },
        Some(("posts", _)) => {
            for post in torum.posts().mine().await? {
                println!("{}  {}", post.post_id, post.post_title);
            }
        }
        Some(("search", sub)) => {
            let query = sub
                .values_of("query")
                .map(|words| words.collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            let results = torum.search().query(&query).await?;
            for post in &results.post_result {
                println!("post      {}  {}", post.post_id, post.post_title);
            }
            for doc in &results.document_result {
                println!("document  {}  {}", doc.docs_id, doc.docs_title);
            }
            if results.is_empty() {
                println!("no results");
            }
        }
        Some(("route", sub)) => {
            let path = sub.value_of("path").unwrap_or("/");
            let decision = torum.guard().navigate(path);
            println!("{:?}", decision);
        }
        _ => unreachable!("subcommand_required"),
    }

    if let Some(error) = torum.error() {
        eprintln!("{}", error);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let matches = cli().get_matches();
    if let Err(err) = run(&matches).await {
        eprintln!("error: {}", err.detail());
        std::process::exit(1);
    }
}
