use std::{
    future::Future,
    io::{self, Write},
};

use clap::Args;
use humanize_duration::{Truncate, prelude::DurationExt};
use investomart::{
    chat::{Conversation, Sender},
    session::AuthToken,
};
use investomart_app::{
    api::ApiError,
    chatbot::{ChatController, SendOutcome},
    context::AppContext,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{output, output_error};

#[derive(Debug, Args)]
pub(crate) struct ChatArgs {
    /// Send a single message and exit instead of starting a conversation
    #[arg(short, long)]
    message: Option<String>,

    /// List past conversations and exit
    #[arg(long, conflicts_with_all = ["message", "resume"])]
    list: bool,

    /// Continue a past conversation
    #[arg(long, value_name = "SESSION_ID")]
    resume: Option<String>,
}

pub(crate) async fn run(app: &AppContext, args: ChatArgs) -> Result<(), String> {
    let mut manager = app.session_manager();

    manager.initialize().await;

    let token = manager.session().map(|session| session.token().clone());
    let controller = app.chat_controller();

    if args.list {
        let token = signed_in(token.as_ref())?;
        let sessions = controller
            .history(token)
            .await
            .map_err(|error| format!("failed to list conversations: {}", error.user_message()))?;

        return output::write_chat_sessions(&mut io::stdout(), &sessions).map_err(output_error);
    }

    controller.check_health().await;

    let mut conversation = match &args.resume {
        Some(session_id) => resume(&controller, session_id, signed_in(token.as_ref())?).await?,
        None => Conversation::new(Uuid::now_v7().to_string()),
    };

    if let Some(message) = args.message {
        return exchange(&controller, &mut conversation, &message, token.as_ref()).await;
    }

    writeln!(
        io::stdout(),
        "Ask the farming assistant anything. Ctrl-C stops a reply, /title <name> renames the \
         chat, /quit, Ctrl-D or Ctrl-C at the prompt leaves."
    )
    .map_err(output_error)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;

        let Some(line) = next_input(&mut lines, interrupted()).await? else {
            writeln!(io::stdout()).map_err(output_error)?;

            break;
        };

        match parse_input(&line) {
            Input::Quit => break,
            Input::Title(title) => {
                if let Err(error) = controller
                    .rename(&mut conversation, title, token.as_ref())
                    .await
                {
                    writeln!(io::stdout(), "Could not save the title: {}", error.user_message())
                        .map_err(output_error)?;
                }
            }
            Input::Message(message) => {
                exchange(&controller, &mut conversation, message, token.as_ref()).await?;
            }
        }
    }

    Ok(())
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Title(&'a str),
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();

    if matches!(trimmed, "/quit" | "/exit") {
        return Input::Quit;
    }

    match trimmed.split_once(char::is_whitespace) {
        Some(("/title", title)) => Input::Title(title),
        None if trimmed == "/title" => Input::Title(""),
        _ => Input::Message(line),
    }
}

/// Next line from `lines`, or `None` once input ends or `interrupt` fires.
async fn next_input<R: AsyncBufRead + Unpin>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = ()>,
) -> Result<Option<String>, String> {
    tokio::select! {
        line = lines.next_line() => line.map_err(|error| format!("failed to read input: {error}")),
        () = interrupt => Ok(None),
    }
}

/// Resolves on Ctrl-C, or never if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn signed_in(token: Option<&AuthToken>) -> Result<&AuthToken, String> {
    token.ok_or_else(|| "sign in to use past conversations".to_string())
}

async fn resume(
    controller: &ChatController,
    session_id: &str,
    token: &AuthToken,
) -> Result<Conversation, String> {
    let failure = |error: ApiError| {
        format!("failed to load conversation: {}", error.user_message())
    };

    let sessions = controller.history(token).await.map_err(failure)?;
    let summary = sessions
        .iter()
        .find(|summary| summary.session_id == session_id)
        .ok_or_else(|| format!("no past conversation with id {session_id}"))?;

    let conversation = controller.resume(summary, token).await.map_err(failure)?;
    let mut out = io::stdout().lock();

    writeln!(out, "{}", conversation.title()).map_err(output_error)?;

    for message in conversation.messages() {
        let speaker = match message.sender {
            Sender::User => "you",
            Sender::Bot => "assistant",
        };

        writeln!(out, "{speaker}: {}", message.text).map_err(output_error)?;
    }

    Ok(conversation)
}

fn prompt() -> Result<(), String> {
    let mut out = io::stdout().lock();

    write!(out, "> ").and_then(|()| out.flush()).map_err(output_error)
}

async fn exchange(
    controller: &ChatController,
    conversation: &mut Conversation,
    message: &str,
    token: Option<&AuthToken>,
) -> Result<(), String> {
    let stop = CancellationToken::new();

    let watcher = tokio::spawn({
        let stop = stop.clone();

        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.cancel();
            }
        }
    });

    let outcome = controller
        .send(conversation, message, token.cloned(), &stop)
        .await;

    watcher.abort();

    if outcome == SendOutcome::Ignored {
        return Ok(());
    }

    let mut out = io::stdout().lock();

    if let Some(reply) = conversation.messages().last() {
        writeln!(out, "{}", reply.text).map_err(output_error)?;
    }

    if let SendOutcome::Replied { elapsed } = outcome {
        writeln!(out, "({})", elapsed.human(Truncate::Millis)).map_err(output_error)?;
    }

    Ok(())
}
