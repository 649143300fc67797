use bytes::Buf;
use futures::TryStreamExt;
use warp::filters::multipart::Part;

use crate::errors::BackendError;

/// Collects a multipart part into a contiguous byte vector.
pub async fn part_as_vec(part: Part) -> Result<Vec<u8>, BackendError> {
    let chunks: Vec<Vec<u8>> = part
        .stream()
        .try_fold(vec![], |mut acc, mut buf| async move {
            acc.push(buf.copy_to_bytes(buf.remaining()).to_vec());
            Ok(acc)
        })
        .await
        .map_err(|_| BackendError::MalformedFormSubmission)?;

    Ok(chunks.concat())
}
