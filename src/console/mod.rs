//! Line-oriented operator console.

pub mod command;
pub mod render;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{debug, info};

use crate::application::{AppContext, PendingOperation};
use crate::core::notify::NotificationReceiver;
pub use command::{parse_command, Command, UsageError};

const MSG_CLOSE_DIALOG: &str = "Close the transfer dialog first (confirm or cancel)";

/// Why the console loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Operator quit or input ended.
    Quit,
    /// The wallet switched networks; the caller rebuilds the context.
    Reload,
}

enum Flow {
    Continue,
    Quit,
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    if !text.ends_with('\n') {
        out.write_all(b"\n").await?;
    }
    out.flush().await
}

async fn flush_notifications<W: AsyncWrite + Unpin>(
    notifications: &mut NotificationReceiver,
    out: &mut W,
) -> std::io::Result<()> {
    while let Ok(n) = notifications.try_recv() {
        write_line(out, &render::render_notification(&n)).await?;
    }
    Ok(())
}

async fn show<W: AsyncWrite + Unpin>(ctx: &AppContext, out: &mut W) -> std::io::Result<()> {
    let session = ctx.session().current();
    write_line(out, &render::render_screen(&session, ctx.store().state())).await
}

/// Runs one command against the context. Register, check and confirm are
/// queued on `pending` instead of awaited. Operation failures are already
/// reported as notifications, so they only end up in the debug log here.
async fn execute<W: AsyncWrite + Unpin>(
    ctx: &mut AppContext,
    command: Command,
    pending: &mut FuturesUnordered<PendingOperation>,
    out: &mut W,
) -> std::io::Result<Flow> {
    let state = ctx.store().state();
    if state.dialog_open() && !command.allowed_in_dialog() {
        write_line(out, MSG_CLOSE_DIALOG).await?;
        return Ok(Flow::Continue);
    }
    if !command.available_in(state.section) {
        write_line(out, &format!("not available in the {} section", state.section)).await?;
        return Ok(Flow::Continue);
    }

    let outcome = match command {
        Command::Quit => return Ok(Flow::Quit),
        Command::Help => {
            write_line(out, render::HELP).await?;
            return Ok(Flow::Continue);
        }
        Command::Show => Ok(()),
        Command::Section(section) => {
            ctx.store_mut().select_section(section);
            Ok(())
        }
        Command::Set(field, value) => {
            ctx.store_mut().set_field(field, value);
            Ok(())
        }
        Command::Dialog(field, value) => {
            ctx.store_mut().set_dialog_field(field, value);
            Ok(())
        }
        Command::Cancel => {
            ctx.store_mut().close_transfer_dialog();
            Ok(())
        }
        Command::OpenTransfer => {
            ctx.store_mut().open_transfer_dialog();
            Ok(())
        }
        Command::Connect => ctx.session().connect().await.map(|_| ()),
        Command::Register => {
            pending.push(ctx.store().begin_register());
            Ok(())
        }
        Command::Check => {
            pending.push(ctx.store().begin_check());
            Ok(())
        }
        Command::Confirm => {
            pending.push(ctx.store().begin_transfer());
            Ok(())
        }
        Command::WalletSwitch(account) => {
            match ctx.wallet_control() {
                Some(control) => {
                    if let Err(failure) = control.switch_account(account).await {
                        write_line(out, &failure.operator_message("Account switch refused")).await?;
                    }
                }
                None => write_line(out, "wallet controls are not available").await?,
            }
            Ok(())
        }
        Command::WalletLock => {
            match ctx.wallet_control() {
                Some(control) => control.lock(),
                None => write_line(out, "wallet controls are not available").await?,
            }
            Ok(())
        }
    };
    if let Err(e) = outcome {
        debug!(error = %e, local = e.is_local(), "command failed");
    }
    Ok(Flow::Continue)
}

/// Drives one application context until the operator quits, input ends or a
/// network change requests a reload. The input lines survive a reload.
///
/// Submissions and queries run alongside input handling: the operator may
/// keep typing while a transaction waits for confirmation. When input ends
/// the loop waits for pending operations; a quit or a reload abandons them.
pub async fn run<R, W>(
    ctx: &mut AppContext,
    notifications: &mut NotificationReceiver,
    lines: &mut Lines<R>,
    out: &mut W,
) -> anyhow::Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut pending: FuturesUnordered<PendingOperation> = FuturesUnordered::new();
    let mut input_open = true;

    show(ctx, out).await?;
    loop {
        if !input_open && pending.is_empty() {
            flush_notifications(notifications, out).await?;
            return Ok(Exit::Quit);
        }
        tokio::select! {
            biased;
            _ = ctx.session().reload_requested() => {
                info!(abandoned = pending.len(), "Network changed, reloading application context");
                flush_notifications(notifications, out).await?;
                return Ok(Exit::Reload);
            }
            Some(notification) = notifications.recv() => {
                let line = render::render_notification(&notification);
                write_line(out, &line).await?;
                show(ctx, out).await?;
            }
            Some(completion) = pending.next(), if !pending.is_empty() => {
                if let Err(e) = ctx.store_mut().complete(completion) {
                    debug!(error = %e, local = e.is_local(), "operation failed");
                }
                flush_notifications(notifications, out).await?;
                show(ctx, out).await?;
            }
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    debug!(pending = pending.len(), "Input ended");
                    input_open = false;
                    continue;
                };
                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(command)) => {
                        let redraw = !matches!(command, Command::Help | Command::Quit);
                        if let Flow::Quit = execute(ctx, command, &mut pending, out).await? {
                            if !pending.is_empty() {
                                info!(abandoned = pending.len(), "Quitting with operations still pending");
                            }
                            flush_notifications(notifications, out).await?;
                            return Ok(Exit::Quit);
                        }
                        flush_notifications(notifications, out).await?;
                        if redraw {
                            show(ctx, out).await?;
                        }
                    }
                    Err(e) => write_line(out, &e.to_string()).await?,
                }
            }
        }
    }
}
