//! Reads valsets, their confirmations and block times from a Cosmos chain running the Peggy module.

pub mod proto;

use anyhow::{Context, Result};
use prost::Message;
use tendermint::block::Height;
use tendermint_rpc::{Client, HttpClient};
use time::OffsetDateTime;

use crate::{
    chain::{BlockTimeSource, ValsetSource},
    types::{Valset, ValsetConfirm},
};

use proto::{
    QueryLastValsetRequestsRequest, QueryLastValsetRequestsResponse,
    QueryValsetConfirmsByNonceRequest, QueryValsetConfirmsByNonceResponse,
    LAST_VALSET_REQUESTS_PATH, VALSET_CONFIRMS_BY_NONCE_PATH,
};

/// A Tendermint RPC backed client for the Peggy module.
#[derive(Clone, Debug)]
pub struct CosmosClient {
    tm_client: HttpClient,
}

impl CosmosClient {
    /// Creates a new `CosmosClient` from an existing Tendermint HTTP client.
    #[must_use]
    pub const fn new(tm_client: HttpClient) -> Self {
        Self { tm_client }
    }

    /// Connects to the Tendermint RPC endpoint at `tm_rpc_url`.
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn connect(tm_rpc_url: &str) -> Result<Self> {
        let tm_client = HttpClient::new(tm_rpc_url)
            .with_context(|| format!("invalid tendermint rpc url `{tm_rpc_url}`"))?;
        Ok(Self::new(tm_client))
    }

    async fn query<Req, Resp>(&self, path: &str, request: Req) -> Result<Resp>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let abci_resp = self
            .tm_client
            .abci_query(Some(path.to_string()), request.encode_to_vec(), None, false)
            .await?;

        if abci_resp.code.is_err() {
            anyhow::bail!(
                "abci query {path} failed with code {}: {}",
                abci_resp.code.value(),
                abci_resp.log
            );
        }

        Ok(Resp::decode(abci_resp.value.as_slice())?)
    }
}

#[async_trait::async_trait]
impl ValsetSource for CosmosClient {
    #[tracing::instrument(skip_all)]
    async fn latest_valsets(&self) -> Result<Vec<Valset>> {
        let resp: QueryLastValsetRequestsResponse = self
            .query(LAST_VALSET_REQUESTS_PATH, QueryLastValsetRequestsRequest {})
            .await?;

        tracing::debug!(count = resp.valsets.len(), "Fetched latest valsets");

        resp.valsets.into_iter().map(Valset::try_from).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn valset_confirms(&self, nonce: u64) -> Result<Vec<ValsetConfirm>> {
        let resp: QueryValsetConfirmsByNonceResponse = self
            .query(
                VALSET_CONFIRMS_BY_NONCE_PATH,
                QueryValsetConfirmsByNonceRequest { nonce },
            )
            .await?;

        resp.confirms
            .into_iter()
            .map(ValsetConfirm::try_from)
            .collect()
    }
}

#[async_trait::async_trait]
impl BlockTimeSource for CosmosClient {
    #[tracing::instrument(skip(self))]
    async fn block_time(&self, height: u64) -> Result<OffsetDateTime> {
        let height_arg =
            Height::try_from(height).map_err(|e| anyhow::anyhow!("invalid height {height}: {e}"))?;
        let block = self.tm_client.block(height_arg).await?;
        let nanos = block.block.header.time.unix_timestamp_nanos();
        Ok(OffsetDateTime::from_unix_timestamp_nanos(nanos)?)
    }
}
