use crate::commitment::generate_salt;
use crate::listing::{self, GameSummary};
use crate::{CommitSecret, GameError, GameRecord, GameView, Move, Phase, Result, RpsContract};
use alloy_primitives::{Address, U256};
use rps_core::{
    CommitmentStore, ConnectorKind, CoreError, NetworkConfig, RpcClient, Storage, WalletConnector,
};
use std::sync::Arc;

/// Connected context for game actions: network, contract binding, wallet
/// connector and the resolved account. Acquired with [`Session::connect`] and
/// released with [`Session::disconnect`].
pub struct Session {
    config: NetworkConfig,
    contract: RpsContract,
    connector: Arc<dyn WalletConnector>,
    storage: Arc<Storage>,
    account: Address,
    chain_id: u64,
}

impl Session {
    pub async fn connect(
        config: NetworkConfig,
        connector: Arc<dyn WalletConnector>,
        storage: Arc<Storage>,
    ) -> Result<Self> {
        config.validate()?;

        let rpc = RpcClient::new(&config.rpc_url)?;
        let chain_id = rpc.chain_id().await?;
        if chain_id != config.chain_id {
            return Err(CoreError::config(format!(
                "Endpoint {} is on chain {}, expected {} ({})",
                config.rpc_url, chain_id, config.chain_id, config.name
            ))
            .into());
        }

        let account = connector.account(&rpc).await?;
        let contract = RpsContract::new(&config, rpc);

        tracing::info!(
            "Connected {} wallet {} to {} (chain {})",
            connector.kind(),
            account,
            config.name,
            chain_id
        );

        Ok(Self {
            config,
            contract,
            connector,
            storage,
            account,
            chain_id,
        })
    }

    pub fn disconnect(self) {
        tracing::info!("Disconnected wallet {}", self.account);
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn contract(&self) -> &RpsContract {
        &self.contract
    }

    pub fn connector_kind(&self) -> ConnectorKind {
        self.connector.kind()
    }

    /// Always yields a view; failures degrade to an unresolved one
    pub async fn load_game(&self, game_id: u64) -> GameView {
        GameView::resolve(game_id, self.contract.game(game_id).await, self.account)
    }

    pub async fn list_games(&self) -> Result<Vec<GameSummary>> {
        listing::fetch_games(&self.contract, self.account, self.config.game_list_window).await
    }

    pub async fn create_game(&self, player_move: Move, stake: U256) -> Result<GameView> {
        if stake.is_zero() {
            return Err(GameError::InvalidStake(
                "Stake must be greater than zero".to_string(),
            ));
        }

        let secret = self.prepare_secret(player_move).await?;
        let commitments = CommitmentStore::new(&self.storage);

        // persisted before sending so the salt survives a crash after mining
        commitments
            .save(&secret.to_record(self.chain_id, self.contract.address(), self.account, None))
            .await?;

        let tx_hash = match self
            .contract
            .send_create(self.connector.as_ref(), secret.commit, stake)
            .await
        {
            Ok(tx_hash) => tx_hash,
            Err(e) => return Err(self.discard_secret(&secret, e).await),
        };
        let (game_id, _) = self.contract.confirm_create(tx_hash).await?;

        commitments
            .assign_game_id(self.chain_id, self.contract.address(), secret.commit, game_id)
            .await?;

        tracing::info!("Created game {} with stake {} wei", game_id, stake);
        Ok(self.load_game(game_id).await)
    }

    pub async fn join_game(&self, game_id: u64, player_move: Move) -> Result<GameView> {
        let record = self.existing_game(game_id).await?;
        record.ensure_joinable(self.account)?;

        let secret = self.prepare_secret(player_move).await?;
        CommitmentStore::new(&self.storage)
            .save(&secret.to_record(
                self.chain_id,
                self.contract.address(),
                self.account,
                Some(game_id),
            ))
            .await?;

        let tx_hash = match self
            .contract
            .send_join(self.connector.as_ref(), game_id, secret.commit, record.stake)
            .await
        {
            Ok(tx_hash) => tx_hash,
            Err(e) => return Err(self.discard_secret(&secret, e).await),
        };
        self.contract.confirm(tx_hash).await?;

        tracing::info!("Joined game {} with stake {} wei", game_id, record.stake);
        Ok(self.load_game(game_id).await)
    }

    /// Reveal with the stored secret, or with `secret` when given
    pub async fn reveal(&self, game_id: u64, secret: Option<CommitSecret>) -> Result<GameView> {
        let record = self.existing_game(game_id).await?;

        if record.phase(self.account) != Phase::Reveal || !record.is_my_turn(self.account) {
            return Err(GameError::NotYourTurn(game_id));
        }

        let secret = match secret {
            Some(secret) => secret,
            None => self.stored_secret(game_id).await?,
        };

        if record.commit_of(self.account) != Some(secret.commit) {
            tracing::warn!(
                "Secret for game {} does not match the on-chain commit; the reveal will likely revert",
                game_id
            );
        }

        self.contract
            .reveal(self.connector.as_ref(), game_id, secret.player_move, secret.salt)
            .await?;

        tracing::info!("Revealed {} in game {}", secret.player_move, game_id);
        Ok(self.load_game(game_id).await)
    }

    pub async fn claim_timeout(&self, game_id: u64) -> Result<GameView> {
        self.existing_game(game_id).await?;
        self.contract
            .claim_timeout(self.connector.as_ref(), game_id)
            .await?;

        tracing::info!("Claimed timeout for game {}", game_id);
        Ok(self.load_game(game_id).await)
    }

    pub async fn cancel_if_no_opponent(&self, game_id: u64) -> Result<GameView> {
        self.existing_game(game_id).await?;
        self.contract
            .cancel_if_no_opponent(self.connector.as_ref(), game_id)
            .await?;

        tracing::info!("Cancelled game {}", game_id);
        Ok(self.load_game(game_id).await)
    }

    pub async fn stored_secret(&self, game_id: u64) -> Result<CommitSecret> {
        let data = CommitmentStore::new(&self.storage)
            .find_for_game(self.chain_id, self.contract.address(), game_id, self.account)
            .await?
            .ok_or(GameError::MissingSecret(game_id))?;

        CommitSecret::try_from(data)
    }

    async fn existing_game(&self, game_id: u64) -> Result<GameRecord> {
        let record = self.contract.game(game_id).await?;
        if !record.exists() {
            return Err(GameError::GameNotFound(game_id));
        }
        Ok(record)
    }

    /// Forget a secret whose transaction never left the wallet, passing `err` through
    async fn discard_secret(&self, secret: &CommitSecret, err: GameError) -> GameError {
        if let Err(e) = CommitmentStore::new(&self.storage)
            .remove(self.chain_id, self.contract.address(), secret.commit)
            .await
        {
            tracing::warn!("Failed to drop unsent secret {}: {}", secret.commit, e);
        }
        err
    }

    /// Fresh secret whose commit the contract agrees with
    async fn prepare_secret(&self, player_move: Move) -> Result<CommitSecret> {
        let salt = generate_salt();
        let mut secret = CommitSecret::with_salt(player_move, salt, self.account)?;

        match self
            .contract
            .compute_commit(player_move, salt, self.account)
            .await
        {
            Ok(onchain) if onchain != secret.commit => {
                tracing::warn!(
                    "Local commit {} differs from contract commit {}; using the contract's",
                    secret.commit,
                    onchain
                );
                secret.commit = onchain;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Could not cross-check commit with the contract: {}", e);
            }
        }

        Ok(secret)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("network", &self.config.name)
            .field("chain_id", &self.chain_id)
            .field("account", &self.account)
            .field("connector", &self.connector.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_commit;
    use alloy_primitives::{address, hex, keccak256, B256};
    use async_trait::async_trait;
    use axum::{extract::State, routing::post, Json, Router};
    use rps_core::TxRequest;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    const ALICE: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const BOB: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
    const NEW_GAME_ID: u64 = 5;

    /// What the local JSON-RPC node answers with
    struct NodeState {
        record: GameRecord,
        commit_override: Option<B256>,
        receipt_status: &'static str,
    }

    type Node = Arc<Mutex<NodeState>>;

    /// Wallet that records how many secrets were stored whenever it is asked to send
    struct RecordingWallet {
        account: Address,
        storage: Arc<Storage>,
        reject: bool,
        sends: Mutex<Vec<(usize, TxRequest)>>,
    }

    #[async_trait]
    impl WalletConnector for RecordingWallet {
        fn kind(&self) -> ConnectorKind {
            ConnectorKind::Local
        }

        async fn account(&self, _rpc: &RpcClient) -> rps_core::Result<Address> {
            Ok(self.account)
        }

        async fn send_transaction(
            &self,
            _rpc: &RpcClient,
            request: TxRequest,
        ) -> rps_core::Result<B256> {
            let stored = CommitmentStore::new(&self.storage)
                .list_for_player(self.account)
                .await?
                .len();
            self.sends.lock().unwrap().push((stored, request));

            if self.reject {
                return Err(CoreError::wallet("User rejected the request"));
            }
            Ok(B256::repeat_byte(0x77))
        }
    }

    struct Harness {
        session: Session,
        wallet: Arc<RecordingWallet>,
        storage: Arc<Storage>,
        node: Node,
        _dir: TempDir,
    }

    impl Harness {
        async fn start(record: GameRecord, reject: bool) -> Self {
            let node: Node = Arc::new(Mutex::new(NodeState {
                record,
                commit_override: None,
                receipt_status: "0x1",
            }));
            let rpc_url = serve(node.clone()).await;

            let dir = tempdir().unwrap();
            let storage = Arc::new(Storage::new(&dir.path().join("rps.db")).await.unwrap());
            let wallet = Arc::new(RecordingWallet {
                account: ALICE,
                storage: storage.clone(),
                reject,
                sends: Mutex::new(Vec::new()),
            });

            let config = NetworkConfig {
                rpc_url,
                contract_address: CONTRACT,
                confirmation_poll_interval: Duration::from_millis(10),
                confirmation_timeout: Duration::from_secs(5),
                ..NetworkConfig::default()
            };
            let connector: Arc<dyn WalletConnector> = wallet.clone();
            let session = Session::connect(config, connector, storage.clone())
                .await
                .unwrap();

            Self {
                session,
                wallet,
                storage,
                node,
                _dir: dir,
            }
        }

        fn stored_counts(&self) -> Vec<usize> {
            self.wallet
                .sends
                .lock()
                .unwrap()
                .iter()
                .map(|(stored, _)| *stored)
                .collect()
        }

        async fn secrets(&self) -> Vec<rps_core::CommitmentData> {
            CommitmentStore::new(&self.storage)
                .list_for_player(ALICE)
                .await
                .unwrap()
        }
    }

    async fn serve(node: Node) -> String {
        let app = Router::new().route("/", post(handle_rpc)).with_state(node);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    async fn handle_rpc(State(node): State<Node>, Json(body): Json<Value>) -> Json<Value> {
        let reply = {
            let node = node.lock().unwrap();
            answer(&node, body["method"].as_str().unwrap_or_default(), &body["params"])
        };

        Json(match reply {
            Ok(result) => json!({"jsonrpc": "2.0", "id": body["id"], "result": result}),
            Err(error) => json!({"jsonrpc": "2.0", "id": body["id"], "error": error}),
        })
    }

    fn answer(node: &NodeState, method: &str, params: &Value) -> std::result::Result<Value, Value> {
        match method {
            "eth_chainId" => Ok(json!("0x7a69")),
            "eth_call" => {
                let data = hex::decode(params[0]["data"].as_str().unwrap_or_default()).unwrap();
                let selector = &data[..4];

                if selector == &keccak256("games(uint256)")[..4] {
                    Ok(json!(hex::encode_prefixed(encode_game(&node.record))))
                } else if selector == &keccak256("computeCommit(uint8,bytes32,address)")[..4] {
                    let commit = node.commit_override.unwrap_or_else(|| {
                        compute_commit(
                            Move::try_from(data[35]).unwrap(),
                            B256::from_slice(&data[36..68]),
                            Address::from_slice(&data[80..100]),
                        )
                    });
                    Ok(json!(commit))
                } else {
                    Err(json!({"code": 3, "message": "execution reverted"}))
                }
            }
            "eth_getTransactionReceipt" => Ok(json!({
                "transactionHash": params[0],
                "blockNumber": "0x1",
                "status": node.receipt_status,
                "logs": [{
                    "address": CONTRACT,
                    "topics": [
                        keccak256("GameCreated(uint256,address,uint128)"),
                        B256::from(U256::from(NEW_GAME_ID)),
                        node.record.player1.into_word(),
                    ],
                    "data": hex::encode_prefixed(B256::from(node.record.stake)),
                }],
            })),
            _ => Err(json!({"code": -32601, "message": format!("{} not supported", method)})),
        }
    }

    fn encode_game(record: &GameRecord) -> Vec<u8> {
        let words = [
            record.player1.into_word(),
            record.player2.into_word(),
            B256::from(record.stake),
            B256::from(U256::from(record.created_at)),
            B256::from(U256::from(record.reveal_deadline)),
            record.player1_commit,
            record.player2_commit,
            B256::from(U256::from(record.player1_move.raw())),
            B256::from(U256::from(record.player2_move.raw())),
            B256::from(U256::from(record.settled as u8)),
        ];
        words.iter().flat_map(|word| word.0).collect()
    }

    fn stake() -> U256 {
        U256::from(10u64).pow(U256::from(16))
    }

    fn open_game(creator: Address) -> GameRecord {
        GameRecord {
            player1: creator,
            player2: Address::ZERO,
            stake: stake(),
            created_at: 1_700_000_000,
            reveal_deadline: 0,
            player1_commit: B256::repeat_byte(0x11),
            player2_commit: B256::ZERO,
            player1_move: Move::None,
            player2_move: Move::None,
            settled: false,
        }
    }

    fn joined_game() -> GameRecord {
        GameRecord {
            player2: ALICE,
            player2_commit: B256::repeat_byte(0x22),
            reveal_deadline: 1_700_000_600,
            ..open_game(BOB)
        }
    }

    #[tokio::test]
    async fn test_connect_resolves_wallet() {
        let h = Harness::start(open_game(ALICE), false).await;

        assert_eq!(h.session.account(), ALICE);
        assert_eq!(h.session.chain_id(), 31337);
        assert_eq!(h.session.connector_kind(), ConnectorKind::Local);
    }

    #[tokio::test]
    async fn test_create_stores_secret_before_sending() {
        let h = Harness::start(open_game(ALICE), false).await;

        let view = h.session.create_game(Move::Rock, stake()).await.unwrap();

        assert_eq!(h.stored_counts(), vec![1]);
        assert_eq!(view.game_id, Some(NEW_GAME_ID));
        assert_eq!(view.phase, Phase::Waiting);

        let secret = h.session.stored_secret(NEW_GAME_ID).await.unwrap();
        assert_eq!(secret.player_move, Move::Rock);

        let (_, request) = h.wallet.sends.lock().unwrap()[0].clone();
        assert_eq!(request.value, Some(stake()));
        assert_eq!(&request.data[4..36], secret.commit.as_slice());
    }

    #[tokio::test]
    async fn test_join_stores_secret_before_sending() {
        let h = Harness::start(open_game(BOB), false).await;

        h.session.join_game(1, Move::Paper).await.unwrap();

        assert_eq!(h.stored_counts(), vec![1]);
        let secret = h.session.stored_secret(1).await.unwrap();
        assert_eq!(secret.player_move, Move::Paper);
    }

    #[tokio::test]
    async fn test_join_own_game_sends_nothing() {
        let h = Harness::start(open_game(ALICE), false).await;

        let result = h.session.join_game(1, Move::Paper).await;

        assert!(matches!(result, Err(GameError::CannotJoin(_))));
        assert!(h.stored_counts().is_empty());
        assert!(h.secrets().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_create_drops_secret() {
        let h = Harness::start(open_game(ALICE), true).await;

        let result = h.session.create_game(Move::Scissors, stake()).await;

        assert!(matches!(result, Err(GameError::Core(CoreError::Wallet(_)))));
        assert_eq!(h.stored_counts(), vec![1]);
        assert!(h.secrets().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_join_drops_secret() {
        let h = Harness::start(open_game(BOB), true).await;

        let result = h.session.join_game(1, Move::Rock).await;

        assert!(matches!(result, Err(GameError::Core(CoreError::Wallet(_)))));
        assert_eq!(h.stored_counts(), vec![1]);
        assert!(h.secrets().await.is_empty());
    }

    #[tokio::test]
    async fn test_reverted_create_keeps_secret() {
        let h = Harness::start(open_game(ALICE), false).await;
        h.node.lock().unwrap().receipt_status = "0x0";

        let result = h.session.create_game(Move::Rock, stake()).await;

        assert!(matches!(result, Err(GameError::Core(CoreError::Reverted { .. }))));
        let secrets = h.secrets().await;
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].game_id, None);
    }

    #[tokio::test]
    async fn test_zero_stake_rejected() {
        let h = Harness::start(open_game(ALICE), false).await;

        let result = h.session.create_game(Move::Rock, U256::ZERO).await;

        assert!(matches!(result, Err(GameError::InvalidStake(_))));
        assert!(h.stored_counts().is_empty());
    }

    #[tokio::test]
    async fn test_reveal_uses_stored_secret() {
        let h = Harness::start(joined_game(), false).await;

        let secret = CommitSecret::new(Move::Rock, ALICE).unwrap();
        CommitmentStore::new(&h.storage)
            .save(&secret.to_record(31337, CONTRACT, ALICE, Some(1)))
            .await
            .unwrap();
        h.node.lock().unwrap().record.player2_commit = secret.commit;

        h.session.reveal(1, None).await.unwrap();

        let (_, request) = h.wallet.sends.lock().unwrap()[0].clone();
        assert_eq!(request.data[67], Move::Rock.raw());
        assert_eq!(&request.data[68..100], secret.salt.as_slice());
    }

    #[tokio::test]
    async fn test_reveal_outside_reveal_phase() {
        let h = Harness::start(open_game(ALICE), false).await;
        assert!(matches!(
            h.session.reveal(1, None).await,
            Err(GameError::NotYourTurn(1))
        ));

        let mut revealed = joined_game();
        revealed.player2_move = Move::Paper;
        h.node.lock().unwrap().record = revealed;
        assert!(matches!(
            h.session.reveal(1, None).await,
            Err(GameError::NotYourTurn(1))
        ));

        assert!(h.stored_counts().is_empty());
    }

    #[tokio::test]
    async fn test_reveal_without_stored_secret() {
        let h = Harness::start(joined_game(), false).await;

        assert!(matches!(
            h.session.reveal(1, None).await,
            Err(GameError::MissingSecret(1))
        ));
        assert!(h.stored_counts().is_empty());
    }

    #[tokio::test]
    async fn test_contract_commit_wins() {
        let h = Harness::start(open_game(ALICE), false).await;

        let agreed = h.session.prepare_secret(Move::Paper).await.unwrap();
        assert_eq!(agreed.commit, compute_commit(Move::Paper, agreed.salt, ALICE));

        h.node.lock().unwrap().commit_override = Some(B256::repeat_byte(0xcc));
        let overridden = h.session.prepare_secret(Move::Scissors).await.unwrap();
        assert_eq!(overridden.commit, B256::repeat_byte(0xcc));
        assert_eq!(overridden.player_move, Move::Scissors);
    }
}
