use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::warn;

use crate::error::Result;

use super::result::ResultRecord;

/// What a concrete agent produces: records, or an error that ends the run.
pub type RecordStream<'a> = BoxStream<'a, Result<ResultRecord>>;

/// What callers see: records only, errors already folded in.
pub type ResultStream<'a> = BoxStream<'a, ResultRecord>;

/// Stamps every record with the agent identity. The first error is turned into
/// a single failure record and ends the stream.
pub fn decorate_stream<'a>(
    agent_id: String,
    session_id: String,
    mut inner: RecordStream<'a>,
) -> ResultStream<'a> {
    Box::pin(stream! {
        while let Some(item) = inner.next().await {
            match item {
                Ok(record) => yield record.stamp(&agent_id, &session_id),
                Err(error) => {
                    warn!(agent = %agent_id, session = %session_id, error = %error, "message processing failed");
                    yield ResultRecord::agent_error(error.to_string()).stamp(&agent_id, &session_id);
                    break;
                }
            }
        }
    })
}
