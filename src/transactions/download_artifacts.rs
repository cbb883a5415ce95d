use std::path::{Path, PathBuf};

use futures::{Stream, TryStreamExt as _};
use sha2::Digest as _;
use tokio::io::AsyncWriteExt as _;
use tokio_util::{bytes::Bytes, io::StreamReader};
use tracing::{debug, error, info, warn};

use crate::{
    client::GitHubClient,
    error::{Error, Result, TransportError},
    workflow::{
        RunId,
        artifact::{Artifact, Artifacts},
    },
};

/// Lists and downloads the artifacts of a run.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: GitHubClient,
}

impl ArtifactFetcher {
    /// Creates an [`ArtifactFetcher`].
    pub const fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    /// Fetches the artifacts attached to a run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if fetching fails.
    pub async fn list_artifacts(&self, run_id: RunId) -> Result<Vec<Artifact>> {
        let url = self
            .client
            .repo_url(&format!("actions/runs/{run_id}/artifacts"));
        let artifacts: Artifacts = self.client.get_json(&url, &[]).await?;

        match artifacts.artifacts.len() {
            1 => info!("fetched 1 artifact from {url}"),
            count => info!("fetched {count} artifacts from {url}"),
        }
        Ok(artifacts.artifacts)
    }

    /// Downloads every artifact of a run into `output_dir`, one after another, and returns how many were written.
    ///
    /// `output_dir` is created if missing. Each artifact lands in `<output_dir>/<name>.zip`, replacing any
    /// previous file. The first failing artifact aborts the remaining ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if listing or downloading fails, [`Error::Io`] if writing fails, or
    /// [`Error::DigestMismatch`] if an artifact arrives broken.
    pub async fn download_all(&self, run_id: RunId, output_dir: &Path) -> Result<usize> {
        self.download_each(run_id, output_dir, |_, _| {}).await
    }

    /// Same as [`download_all`](Self::download_all), calling `on_download` with each written artifact and file.
    ///
    /// # Errors
    ///
    /// See [`download_all`](Self::download_all).
    pub async fn download_each<F>(
        &self,
        run_id: RunId,
        output_dir: &Path,
        mut on_download: F,
    ) -> Result<usize>
    where
        F: FnMut(&Artifact, &Path),
    {
        let artifacts = self.list_artifacts(run_id).await?;

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| Error::io(output_dir, source))?;

        for artifact in &artifacts {
            let path = self.download(artifact, output_dir).await?;
            on_download(artifact, &path);
        }

        Ok(artifacts.len())
    }

    /// Streams one artifact to `<output_dir>/<name>.zip` and returns the written path.
    ///
    /// When the artifact advertises a sha256 digest the streamed bytes are checked against it, and a
    /// mismatching file is removed again.
    ///
    /// # Errors
    ///
    /// See [`download_all`](Self::download_all).
    pub async fn download(&self, artifact: &Artifact, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(artifact.file_name());
        if artifact.expired {
            warn!("artifact {artifact} is marked as expired, requesting anyway");
        }

        let stream = self
            .client
            .download(&artifact.archive_download_url)
            .await?;
        info!("downloading artifact {artifact}…");

        let written = save(artifact, stream, &path).await?;
        info!("downloaded {} ({written} bytes) to {path:?}", artifact.name);
        Ok(path)
    }
}

/// Writes `stream` to `path`. Whatever was written is removed again if anything fails.
async fn save<S>(artifact: &Artifact, stream: S, path: &Path) -> Result<u64>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    let file = tokio::fs::File::create(path)
        .await
        .map_err(|source| Error::io(path, source))?;

    let result = write_verified(artifact, stream, file, path).await;
    if let Err(err) = &result {
        error!("failed to download {artifact} to {path:?}: {err}");
        drop(tokio::fs::remove_file(path).await);
    }
    result
}

/// Copies `stream` into `file` and checks the result against the artifact's digest.
async fn write_verified<S>(
    artifact: &Artifact,
    stream: S,
    mut file: tokio::fs::File,
    path: &Path,
) -> Result<u64>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    let mut sha_hasher = sha2::Sha256::new();
    let mut reader = StreamReader::new(Box::pin(
        stream
            .map_ok(|bytes| {
                sha_hasher.update(&bytes);
                bytes
            })
            .map_err(std::io::Error::other),
    ));

    let written = tokio::io::copy(&mut reader, &mut file)
        .await
        .map_err(|err| copy_error(&artifact.archive_download_url, path, err))?;
    file.flush()
        .await
        .map_err(|source| Error::io(path, source))?;
    drop(reader);

    let actual = hex::encode(sha_hasher.finalize());
    match artifact.sha256() {
        Some(expected) if !expected.eq_ignore_ascii_case(&actual) => Err(Error::DigestMismatch {
            artifact: artifact.name.clone(),
            expected: expected.to_owned(),
            actual,
        }),
        Some(_) => {
            debug!("verified digest of {artifact}");
            Ok(written)
        }
        None => {
            debug!("digest not provided for {artifact}");
            Ok(written)
        }
    }
}

/// Splits a failed copy into the side that broke: the response stream or the file.
fn copy_error(url: &str, path: &Path, err: std::io::Error) -> Error {
    if !err
        .get_ref()
        .is_some_and(|inner| inner.is::<reqwest::Error>())
    {
        return Error::io(path, err);
    }

    match err
        .into_inner()
        .map(|inner| inner.downcast::<reqwest::Error>())
    {
        Some(Ok(source)) => {
            error!("download from {url} broke off: {source}");
            TransportError::Decode {
                url: url.to_owned(),
                source: *source,
            }
            .into()
        }
        _ => Error::io(path, std::io::Error::other("response stream failed")),
    }
}
