//! `event` subcommands.

use std::collections::BTreeMap;

use ensync_api_models::{Event, EventId};
use ensync_client::{CancellationToken, EventService};

use crate::cli::{EventCreateArgs, EventGetArgs, EventUpdateArgs, ListArgs, PayloadInput};
use crate::client::{CliError, CliResult};
use crate::commands::read_json_input;
use crate::output::CommandOutput;

fn read_payload(input: &PayloadInput) -> CliResult<BTreeMap<String, String>> {
    Ok(read_json_input(
        input.payload.as_deref(),
        input.payload_file.as_deref(),
        "payload",
    )?
    .unwrap_or_default())
}

pub(crate) async fn list<S: EventService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &ListArgs,
) -> CliResult<CommandOutput> {
    let events = service.list_events(cancel, &args.to_params()).await?;
    CommandOutput::json(&events)
}

pub(crate) async fn get<S: EventService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &EventGetArgs,
) -> CliResult<CommandOutput> {
    let event = service.get_event(cancel, &args.name).await?;
    CommandOutput::json(&event)
}

pub(crate) async fn create<S: EventService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &EventCreateArgs,
) -> CliResult<CommandOutput> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::validation("name is required"));
    }
    let event = Event::new(name, read_payload(&args.payload)?);
    service.create_event(cancel, &event).await?;
    Ok(CommandOutput::message(format!(
        "Event '{name}' created successfully"
    )))
}

pub(crate) async fn update<S: EventService + ?Sized>(
    service: &S,
    cancel: &CancellationToken,
    args: &EventUpdateArgs,
) -> CliResult<CommandOutput> {
    let id = EventId::parse(args.id.trim());
    if id.is_empty() {
        return Err(CliError::validation("id is required"));
    }
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::validation("name is required"));
    }
    let event = Event::new(name, read_payload(&args.payload)?).with_id(id.clone());
    service.update_event(cancel, &event).await?;
    Ok(CommandOutput::message(format!(
        "Event '{id}' updated successfully"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OrderArg, OrderByArg};
    use async_trait::async_trait;
    use ensync_api_models::{EventList, ListParams, SortOrder};
    use ensync_client::{ApiError, ClientError, ClientResult};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingEvents {
        listed: Mutex<Vec<ListParams>>,
        written: Mutex<Vec<Event>>,
        fail_with: Option<u16>,
    }

    impl RecordingEvents {
        fn failure(&self, operation: &'static str) -> ClientResult<()> {
            self.fail_with.map_or(Ok(()), |status| {
                Err(ClientError::Operation {
                    operation,
                    source: Box::new(ClientError::Api(ApiError::from_response(
                        status,
                        br#"{"message":"Invalid API key"}"#,
                    ))),
                })
            })
        }
    }

    #[async_trait]
    impl EventService for RecordingEvents {
        async fn list_events(
            &self,
            _cancel: &CancellationToken,
            params: &ListParams,
        ) -> ClientResult<EventList> {
            self.failure("list events")?;
            self.listed.lock().expect("lock").push(params.clone());
            Ok(EventList {
                results_length: 1,
                results: vec![Event::new("orders", BTreeMap::new()).with_id(1_i64)],
            })
        }

        async fn get_event(&self, _cancel: &CancellationToken, name: &str) -> ClientResult<Event> {
            Ok(Event::new(name, BTreeMap::new()))
        }

        async fn create_event(&self, _cancel: &CancellationToken, event: &Event) -> ClientResult<()> {
            self.written.lock().expect("lock").push(event.clone());
            Ok(())
        }

        async fn update_event(&self, _cancel: &CancellationToken, event: &Event) -> ClientResult<()> {
            self.written.lock().expect("lock").push(event.clone());
            Ok(())
        }
    }

    fn no_payload() -> PayloadInput {
        PayloadInput::default()
    }

    #[tokio::test]
    async fn list_forwards_params_and_prints_json() {
        let service = RecordingEvents::default();
        let args = ListArgs {
            page: 1,
            limit: 5,
            order: OrderArg::Asc,
            order_by: OrderByArg::Name,
        };
        let output = list(&service, &CancellationToken::new(), &args)
            .await
            .expect("list");

        let listed = service.listed.lock().expect("lock").clone();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].page_index, 1);
        assert_eq!(listed[0].limit, 5);
        assert_eq!(listed[0].order, SortOrder::Ascending);
        assert!(matches!(output, CommandOutput::Json(_)));
        assert!(output.text().contains("\"resultsLength\": 1"));
    }

    #[tokio::test]
    async fn api_failures_exit_with_operational_code() {
        let service = RecordingEvents {
            fail_with: Some(401),
            ..RecordingEvents::default()
        };
        let args = ListArgs {
            page: 0,
            limit: 10,
            order: OrderArg::Desc,
            order_by: OrderByArg::CreatedAt,
        };
        let err = list(&service, &CancellationToken::new(), &args)
            .await
            .expect_err("should fail");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.display_message(),
            "failed to list events: API request failed with status 401: Invalid API key"
        );
    }

    #[tokio::test]
    async fn create_reads_inline_payload() {
        let service = RecordingEvents::default();
        let args = EventCreateArgs {
            name: "orders/created".into(),
            payload: PayloadInput {
                payload: Some(r#"{"orderId":"string"}"#.into()),
                payload_file: None,
            },
        };
        let output = create(&service, &CancellationToken::new(), &args)
            .await
            .expect("create");

        assert_eq!(output.text(), "Event 'orders/created' created successfully");
        let written = service.written.lock().expect("lock").clone();
        assert_eq!(written[0].name, "orders/created");
        assert_eq!(
            written[0].payload.get("orderId").map(String::as_str),
            Some("string")
        );
    }

    #[tokio::test]
    async fn update_sets_id_and_rejects_blank_values() {
        let service = RecordingEvents::default();
        let args = EventUpdateArgs {
            id: "42".into(),
            name: "orders/placed".into(),
            payload: no_payload(),
        };
        let output = update(&service, &CancellationToken::new(), &args)
            .await
            .expect("update");
        assert_eq!(output.text(), "Event '42' updated successfully");
        let written = service.written.lock().expect("lock").clone();
        assert_eq!(written[0].id, Some(EventId::Numeric(42)));

        let blank = EventUpdateArgs {
            id: " ".into(),
            name: "orders/placed".into(),
            payload: no_payload(),
        };
        let err = update(&service, &CancellationToken::new(), &blank)
            .await
            .expect_err("blank id");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(service.written.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_the_id_text_verbatim() {
        let service = RecordingEvents::default();
        for raw in ["007", "+5", "00"] {
            let args = EventUpdateArgs {
                id: raw.into(),
                name: "orders/placed".into(),
                payload: no_payload(),
            };
            let output = update(&service, &CancellationToken::new(), &args)
                .await
                .expect("update");
            assert_eq!(output.text(), format!("Event '{raw}' updated successfully"));
        }
        let ids: Vec<String> = service
            .written
            .lock()
            .expect("lock")
            .iter()
            .filter_map(|event| event.id.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(ids, ["007", "+5", "00"]);
    }
}
