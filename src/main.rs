use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use datachat::config::ClientConfig;
use datachat::model::{
    DurationLimit, MessageKind, ModelName, Performance, Role, TranscribeTask,
};
use datachat::subtitle::text_at_time;
use datachat::DataChatClient;

const HELP: &str = "\
commands:
  upload <path>...   upload data or media files
  files              list uploaded files
  pick <index>       select which uploaded file is active
  head <rows>        limit number of rows
  apply              commit the row selection
  ask <question>     query the AI about the selected data
  recall <id>        re-populate the input from a prior question
  model <name>       switch LLM (bamboo | openai)
  perf <level>       transcription performance (fastest|fast|balanced|accurate)
  limit <full|head>  transcription coverage
  task <transcribe|translate>
  prompt <text>      free-text description for transcription
  transcribe         run transcription with current preferences
  play               simulate playback with captions
  log                print the conversation
  state              print selection state
  quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, "DataChat client starting");
    let mut client = DataChatClient::new(&config);

    match client.connect().await {
        Ok(session) => println!("connected, session {}", session.token),
        Err(err) => println!("{err} (session creation retried on next command)"),
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(&client);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        // Session creation is retryable; on failure later requests go out
        // tokenless and surface the 403.
        let _ = client.connect().await;

        let outcome = match command {
            "" => Ok(()),
            "help" => {
                println!("{HELP}");
                Ok(())
            }
            "upload" => {
                let paths: Vec<&Path> = rest.split_whitespace().map(Path::new).collect();
                client.upload(&paths).await
            }
            "files" => {
                for file in client.machine().uploaded_files() {
                    match file.rows {
                        Some(rows) => println!("  [{}] {} ({rows} rows)", file.index, file.label),
                        None => println!("  [{}] {} (media)", file.index, file.label),
                    }
                }
                Ok(())
            }
            "pick" => match rest.parse::<usize>() {
                Ok(index) => client.machine_mut().pick_file(index),
                Err(_) => {
                    println!("usage: pick <index>");
                    Ok(())
                }
            },
            "head" => match rest.parse::<u64>() {
                Ok(rows) => client.machine_mut().set_head(rows),
                Err(_) => {
                    println!("usage: head <rows>");
                    Ok(())
                }
            },
            "apply" => client.apply_selection().await,
            "ask" => client.send_query(rest).await,
            "recall" => match rest.parse::<u64>() {
                Ok(id) => {
                    match client.log().recall(id) {
                        Some(text) => println!("input: {text}"),
                        None => println!("no user message with id {id}"),
                    }
                    Ok(())
                }
                Err(_) => {
                    println!("usage: recall <id>");
                    Ok(())
                }
            },
            "model" => match ModelName::parse(rest) {
                Some(model) => client.switch_model(model).await,
                None => {
                    println!("usage: model <bamboo|openai>");
                    Ok(())
                }
            },
            "perf" => match Performance::parse(rest) {
                Some(level) => {
                    client.machine_mut().set_performance(level);
                    Ok(())
                }
                None => {
                    println!("usage: perf <fastest|fast|balanced|accurate>");
                    Ok(())
                }
            },
            "limit" => {
                match rest {
                    "full" => client.machine_mut().set_limit(DurationLimit::Full),
                    "head" => client.machine_mut().set_limit(DurationLimit::Head),
                    _ => println!("usage: limit <full|head>"),
                }
                Ok(())
            }
            "task" => {
                match rest {
                    "transcribe" => client.machine_mut().set_task(TranscribeTask::Transcribe),
                    "translate" => client.machine_mut().set_task(TranscribeTask::Translate),
                    _ => println!("usage: task <transcribe|translate>"),
                }
                Ok(())
            }
            "prompt" => {
                client.machine_mut().set_prompt(rest.to_string());
                Ok(())
            }
            "transcribe" => client.transcribe().await,
            "play" => {
                play(&client).await;
                Ok(())
            }
            "log" => {
                print_log(&client);
                Ok(())
            }
            "state" => {
                print_state(&client);
                Ok(())
            }
            "quit" | "exit" => break,
            other => {
                println!("unknown command: {other} (try help)");
                Ok(())
            }
        };
        if let Err(err) = outcome {
            println!("error: {err}");
        }
    }
    Ok(())
}

fn print_prompt(client: &DataChatClient) {
    let state = format!("{:?}", client.machine().state()).to_lowercase();
    println!("-- {} | model {} --", state, client.model().as_str());
}

fn print_log(client: &DataChatClient) {
    for message in client.log().messages() {
        let who = match message.role {
            Role::User => "you",
            Role::Ai => " ai",
        };
        match message.kind {
            MessageKind::Pending => println!("{who} #{}: ...", message.id),
            _ => println!("{who} #{}: {}", message.id, message.body),
        }
    }
}

fn print_state(client: &DataChatClient) {
    let machine = client.machine();
    println!("state: {:?}, dirty: {}", machine.state(), machine.dirty());
    match machine.selection() {
        Some(selection) if selection.media => {
            println!(
                "media selection: {} ({})",
                selection.filename,
                selection
                    .media_type
                    .map(|t| t.as_str())
                    .unwrap_or("unknown")
            );
            if let Some(detection) = machine.detection() {
                println!(
                    "  duration {:.1}s, language {} ({}), estimated cost {}",
                    detection.duration,
                    detection.lang,
                    detection.language,
                    detection
                        .estimated_cost
                        .map(|c| format!("${c:.3}"))
                        .unwrap_or_else(|| "unknown".into()),
                );
            }
            println!(
                "  prefs: {:?}, coverage offered: {}, translation offered: {}",
                machine.prefs(),
                machine.offers_duration_limit(),
                machine.offers_translation(),
            );
        }
        Some(selection) => {
            println!(
                "data selection: {} head {:?} (of {}) committed {}",
                selection.filename,
                selection.head,
                machine.max_rows(),
                selection.committed
            );
        }
        None => println!("no selection"),
    }
}

/// Stand-in for the external media player: emit time updates over the
/// detected duration and print the caption whenever it changes.
async fn play(client: &DataChatClient) {
    let Some(result) = client
        .machine()
        .selection()
        .and_then(|s| s.result.as_ref())
        .filter(|r| r.decoded)
    else {
        println!("nothing transcribed to play");
        return;
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut time = 0.0_f64;
    let mut caption = String::new();
    while time <= result.duration {
        ticker.tick().await;
        let text = text_at_time(time, result);
        if text != caption {
            println!("[{time:6.1}s] {text}");
            caption = text;
        }
        time += 0.5;
    }
    println!("playback finished");
}
