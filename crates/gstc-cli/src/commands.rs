//! Subcommands and their handlers. Every handler maps onto one facade call
//! and prints the result as pretty JSON on stdout.

use anyhow::{Context, Result};
use clap::{ArgAction, Subcommand};
use gstc_config::AppConfig;
use gstc_core::{BusEvent, BusPoller, CloseReason, GstdClient, PollExit, Seek};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum PipelineCommand {
    /// List pipeline names.
    List,
    /// Create a pipeline from a gst-launch description.
    Create { name: String, description: String },
    /// Delete a pipeline.
    Delete { name: String },
    /// Set a pipeline to PLAYING.
    Play { name: String },
    /// Set a pipeline to PAUSED.
    Pause { name: String },
    /// Set a pipeline to NULL.
    Stop { name: String },
    /// Print the pipeline graph.
    Graph { name: String },
    /// Toggle verbose output for a pipeline.
    Verbose {
        name: String,
        #[arg(action = ArgAction::Set)]
        enable: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ElementCommand {
    /// Read a property value.
    Get {
        pipeline: String,
        element: String,
        property: String,
    },
    /// Write a property value.
    Set {
        pipeline: String,
        element: String,
        property: String,
        value: String,
    },
    /// List element names in a pipeline.
    List { pipeline: String },
    /// List property names of an element.
    Properties { pipeline: String, element: String },
    /// List signal names of an element.
    Signals { pipeline: String, element: String },
    /// Emit an action signal.
    Action {
        pipeline: String,
        element: String,
        action: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SignalCommand {
    /// Wait for a signal and print its arguments.
    Connect {
        pipeline: String,
        element: String,
        signal: String,
        /// Set the wait timeout in microseconds first (-1 forever).
        #[arg(long, allow_negative_numbers = true)]
        timeout: Option<i64>,
    },
    /// Stop waiting for a signal.
    Disconnect {
        pipeline: String,
        element: String,
        signal: String,
    },
    /// Set the wait timeout in microseconds (-1 forever).
    Timeout {
        pipeline: String,
        element: String,
        signal: String,
        #[arg(allow_negative_numbers = true)]
        timeout: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum BusCommand {
    /// Set the message type filter (e.g. `error+warning+eos`).
    Filter { pipeline: String, filter: String },
    /// Read one message; prints `null` when none arrived in time.
    Read { pipeline: String },
    /// Set the read timeout in nanoseconds (-1 forever).
    Timeout {
        pipeline: String,
        #[arg(allow_negative_numbers = true)]
        timeout: i64,
    },
    /// Print bus messages until the bus closes or Ctrl-C.
    Watch {
        pipeline: String,
        /// Message filter; defaults to `bus.filter` from the config.
        #[arg(long)]
        filter: Option<String>,
        /// Read timeout in nanoseconds; defaults to `bus.timeout_ns`.
        #[arg(long, allow_negative_numbers = true)]
        timeout: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum EventCommand {
    /// Seek the pipeline.
    Seek {
        pipeline: String,
        #[arg(long, default_value_t = 1.0)]
        rate: f64,
        #[arg(long, default_value_t = 3)]
        format: i32,
        #[arg(long, default_value_t = 1)]
        flags: i32,
        #[arg(long, default_value_t = 1)]
        start_type: i32,
        #[arg(long, default_value_t = 0)]
        start: i64,
        #[arg(long, default_value_t = 1)]
        end_type: i32,
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        end: i64,
    },
    /// Send end-of-stream.
    Eos { pipeline: String },
    /// Start a flush.
    FlushStart { pipeline: String },
    /// Stop a flush.
    FlushStop {
        pipeline: String,
        /// Reset running time.
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        reset: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum DebugCommand {
    /// Enable or disable debug output.
    Enable {
        #[arg(action = ArgAction::Set)]
        enable: bool,
    },
    /// Enable or disable colored debug output.
    Color {
        #[arg(action = ArgAction::Set)]
        color: bool,
    },
    /// Reset (true) or keep (false) existing thresholds when setting a new one.
    Reset {
        #[arg(action = ArgAction::Set)]
        reset: bool,
    },
    /// Set the debug threshold, as in GST_DEBUG (e.g. `*:3`).
    Threshold { threshold: String },
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{out}");
    Ok(())
}

pub async fn ping(client: &GstdClient) -> Result<()> {
    client.ping().await?;
    print_json(&json!({ "address": client.address().to_string(), "reachable": true }))
}

pub async fn pipeline(client: &GstdClient, cmd: PipelineCommand) -> Result<()> {
    match cmd {
        PipelineCommand::List => print_json(&client.list_pipelines().await?),
        PipelineCommand::Create { name, description } => {
            print_json(&client.pipeline_create(&name, &description).await?)
        }
        PipelineCommand::Delete { name } => print_json(&client.pipeline_delete(&name).await?),
        PipelineCommand::Play { name } => print_json(&client.pipeline_play(&name).await?),
        PipelineCommand::Pause { name } => print_json(&client.pipeline_pause(&name).await?),
        PipelineCommand::Stop { name } => print_json(&client.pipeline_stop(&name).await?),
        PipelineCommand::Graph { name } => print_json(&client.pipeline_graph(&name).await?),
        PipelineCommand::Verbose { name, enable } => {
            print_json(&client.pipeline_verbose(&name, enable).await?)
        }
    }
}

pub async fn element(client: &GstdClient, cmd: ElementCommand) -> Result<()> {
    match cmd {
        ElementCommand::Get {
            pipeline,
            element,
            property,
        } => print_json(&client.element_get(&pipeline, &element, &property).await?),
        ElementCommand::Set {
            pipeline,
            element,
            property,
            value,
        } => print_json(
            &client
                .element_set(&pipeline, &element, &property, &value)
                .await?,
        ),
        ElementCommand::List { pipeline } => print_json(&client.list_elements(&pipeline).await?),
        ElementCommand::Properties { pipeline, element } => {
            print_json(&client.list_properties(&pipeline, &element).await?)
        }
        ElementCommand::Signals { pipeline, element } => {
            print_json(&client.list_signals(&pipeline, &element).await?)
        }
        ElementCommand::Action {
            pipeline,
            element,
            action,
        } => print_json(&client.action_emit(&pipeline, &element, &action).await?),
    }
}

pub async fn signal(client: &GstdClient, cmd: SignalCommand) -> Result<()> {
    match cmd {
        SignalCommand::Connect {
            pipeline,
            element,
            signal,
            timeout,
        } => {
            let resp = match timeout {
                Some(timeout) => {
                    client
                        .signal_connect_timeout(&pipeline, &element, &signal, timeout)
                        .await?
                }
                None => client.signal_connect(&pipeline, &element, &signal).await?,
            };
            print_json(&resp)
        }
        SignalCommand::Disconnect {
            pipeline,
            element,
            signal,
        } => print_json(&client.signal_disconnect(&pipeline, &element, &signal).await?),
        SignalCommand::Timeout {
            pipeline,
            element,
            signal,
            timeout,
        } => print_json(
            &client
                .signal_timeout(&pipeline, &element, &signal, timeout)
                .await?,
        ),
    }
}

pub async fn bus(client: &GstdClient, config: &AppConfig, cmd: BusCommand) -> Result<()> {
    match cmd {
        BusCommand::Filter { pipeline, filter } => {
            print_json(&client.bus_filter(&pipeline, &filter).await?)
        }
        BusCommand::Read { pipeline } => {
            print_json(&client.bus_read(&pipeline).await?.into_payload())
        }
        BusCommand::Timeout { pipeline, timeout } => {
            print_json(&client.bus_timeout(&pipeline, timeout).await?)
        }
        BusCommand::Watch {
            pipeline,
            filter,
            timeout,
        } => {
            let filter = filter.unwrap_or_else(|| config.bus.filter.clone());
            let timeout = timeout.unwrap_or(config.bus.timeout_ns);
            // A request timeout shorter than the long poll would read as a
            // failed bus.
            config
                .client
                .check_bus_timeout(timeout)
                .context("--timeout conflicts with client.request_timeout_secs")?;
            watch(client, &pipeline, &filter, timeout).await
        }
    }
}

/// Poll a bus until it closes or the user interrupts.
async fn watch(client: &GstdClient, pipeline: &str, filter: &str, timeout_ns: i64) -> Result<()> {
    let mut poller = BusPoller::new(client.clone(), pipeline);
    poller
        .configure(filter, timeout_ns)
        .await
        .with_context(|| format!("failed to configure bus of '{pipeline}'"))?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping after the current read");
            ctrl_c.cancel();
        }
    });

    let mut closed = None;
    let mut printed = Ok(());
    let exit = poller
        .run(
            |event| match event {
                BusEvent::Message { message, .. } => {
                    if printed.is_ok() {
                        printed = print_json(&message);
                    }
                }
                BusEvent::Closed(c) => closed = Some(c),
            },
            &cancel,
        )
        .await;
    printed?;

    match (exit, closed) {
        (PollExit::Closed, Some(c)) if c.reason == CloseReason::PipelineGone => {
            info!(pipeline = %c.pipeline, "Pipeline no longer exists");
            Ok(())
        }
        (PollExit::Closed, Some(c)) => {
            Err(anyhow::Error::new(c.error).context(format!("bus of '{}' closed", c.pipeline)))
        }
        _ => Ok(()),
    }
}

pub async fn event(client: &GstdClient, cmd: EventCommand) -> Result<()> {
    match cmd {
        EventCommand::Seek {
            pipeline,
            rate,
            format,
            flags,
            start_type,
            start,
            end_type,
            end,
        } => {
            let seek = Seek {
                rate,
                format,
                flags,
                start_type,
                start,
                end_type,
                end,
            };
            print_json(&client.event_seek(&pipeline, &seek).await?)
        }
        EventCommand::Eos { pipeline } => print_json(&client.event_eos(&pipeline).await?),
        EventCommand::FlushStart { pipeline } => {
            print_json(&client.event_flush_start(&pipeline).await?)
        }
        EventCommand::FlushStop { pipeline, reset } => {
            print_json(&client.event_flush_stop(&pipeline, reset).await?)
        }
    }
}

pub async fn debug(client: &GstdClient, cmd: DebugCommand) -> Result<()> {
    match cmd {
        DebugCommand::Enable { enable } => print_json(&client.debug_enable(enable).await?),
        DebugCommand::Color { color } => print_json(&client.debug_color(color).await?),
        DebugCommand::Reset { reset } => print_json(&client.debug_reset(reset).await?),
        DebugCommand::Threshold { threshold } => {
            print_json(&client.debug_threshold(&threshold).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gstc_test_utils::config::TestConfigBuilder;
    use gstc_test_utils::{MockDaemon, Reply};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn client_for(mock: &MockDaemon) -> GstdClient {
        GstdClient::from_config(&mock.config()).unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_commands_hit_expected_resources() {
        let mock = MockDaemon::start().await;
        let client = client_for(&mock);

        pipeline(
            &client,
            PipelineCommand::Create {
                name: "p0".to_string(),
                description: "fakesrc!fakesink".to_string(),
            },
        )
        .await
        .unwrap();
        pipeline(&client, PipelineCommand::Play { name: "p0".to_string() })
            .await
            .unwrap();

        let seen: Vec<_> = mock
            .requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("POST".to_string(), "/pipelines".to_string()),
                ("PUT".to_string(), "/pipelines/p0/state".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_daemon_error_becomes_command_error() {
        let mock = MockDaemon::start().await;
        mock.push_reply(Reply::daemon_error(5, "Pipeline requested doesn't exist"));
        let client = client_for(&mock);

        let err = pipeline(&client, PipelineCommand::Stop { name: "p9".to_string() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Pipeline requested doesn't exist"));
    }

    #[tokio::test]
    async fn test_watch_ends_quietly_when_pipeline_is_gone() {
        let mock = MockDaemon::start().await;
        mock.push_replies([
            Reply::success(Value::Null),
            Reply::success(json!({ "type": "eos" })),
            Reply::daemon_error(5, "Pipeline requested doesn't exist"),
        ]);
        let client = client_for(&mock);

        watch(&client, "p0", "", 1_000).await.unwrap();
        // timeout update, one message, the failing read
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_watch_timeout_override_must_fit_request_timeout() {
        let mock = MockDaemon::start().await;
        let config = TestConfigBuilder::new()
            .daemon_host(&mock.host())
            .daemon_port(mock.port())
            .request_timeout_secs(5)
            .build();
        let client = GstdClient::from_config(&config).unwrap();

        for timeout in [-1, 5_000_000_000, 30_000_000_000] {
            let err = bus(
                &client,
                &config,
                BusCommand::Watch {
                    pipeline: "p0".to_string(),
                    filter: None,
                    timeout: Some(timeout),
                },
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("--timeout"), "{err:#}");
        }
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_watch_default_timeout_within_request_timeout_runs() {
        let mock = MockDaemon::start().await;
        mock.push_replies([
            Reply::success(Value::Null),
            Reply::daemon_error(5, "Pipeline requested doesn't exist"),
        ]);
        let config = TestConfigBuilder::new()
            .daemon_host(&mock.host())
            .daemon_port(mock.port())
            .request_timeout_secs(5)
            .build();
        let client = GstdClient::from_config(&config).unwrap();

        bus(
            &client,
            &config,
            BusCommand::Watch {
                pipeline: "p0".to_string(),
                filter: None,
                timeout: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_watch_fails_on_transport_error() {
        let mock = MockDaemon::start().await;
        mock.push_replies([
            Reply::success(Value::Null),
            Reply::success(Value::Null),
            Reply::garbage(502, "bad gateway"),
        ]);
        let client = client_for(&mock);

        let err = watch(&client, "p0", "eos", 1_000).await.unwrap_err();
        assert!(err.to_string().contains("bus of 'p0' closed"));
        assert!(format!("{err:#}").contains("corrupted response"));
    }
}
