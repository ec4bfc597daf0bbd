use crate::commands::wallet::read_password;
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use rps_core::wallet::parse_address;
use rps_core::{
    Address, CommitmentStore, CoreError, NetworkConfig, NodeConnector, RpcClient, WalletConnector,
    WalletManager, B256,
};
use rps_game::display::{format_address, format_stake, format_timestamp, parse_stake};
use rps_game::listing::fetch_games;
use rps_game::{
    CommitSecret, GameError, GameSummary, GameView, Move, Phase, Result, RpsContract, Session,
    ShareLinks,
};
use std::sync::Arc;

/// How to reach a wallet. Without either option, read-only commands run as a spectator.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
    /// Local wallet to sign with
    #[arg(short, long, conflicts_with = "injected")]
    pub wallet: Option<String>,

    /// Let the RPC endpoint sign, like an injected browser wallet
    #[arg(long)]
    pub injected: bool,

    /// Endpoint account to use with --injected
    #[arg(long, requires = "injected")]
    pub account: Option<String>,
}

#[derive(Subcommand)]
pub enum GameCommands {
    /// Create a game by committing to a move
    Create {
        #[command(flatten)]
        connect: ConnectArgs,
        /// rock, paper or scissors
        #[arg(short = 'm', long = "move")]
        player_move: Move,
        /// Stake in ETH, e.g. 0.01
        #[arg(short, long)]
        stake: String,
    },
    /// Join an open game with the same stake
    Join {
        #[command(flatten)]
        connect: ConnectArgs,
        game_id: u64,
        /// rock, paper or scissors
        #[arg(short = 'm', long = "move")]
        player_move: Move,
    },
    /// Reveal your committed move
    Reveal {
        #[command(flatten)]
        connect: ConnectArgs,
        game_id: u64,
        /// Move to reveal instead of the stored secret
        #[arg(short = 'm', long = "move", requires = "salt")]
        player_move: Option<Move>,
        /// Salt (hex) to reveal instead of the stored secret
        #[arg(long, requires = "player_move")]
        salt: Option<String>,
    },
    /// Claim the stakes after the opponent missed the reveal deadline
    ClaimTimeout {
        #[command(flatten)]
        connect: ConnectArgs,
        game_id: u64,
    },
    /// Cancel your game while nobody has joined
    Cancel {
        #[command(flatten)]
        connect: ConnectArgs,
        game_id: u64,
    },
    /// Show one game
    Status {
        #[command(flatten)]
        connect: ConnectArgs,
        game_id: u64,
    },
    /// List recent games
    List {
        #[command(flatten)]
        connect: ConnectArgs,
        /// Only games you can join
        #[arg(long, conflicts_with = "mine")]
        joinable: bool,
        /// Only games you play in
        #[arg(long)]
        mine: bool,
    },
    /// Print invite links for a game
    Share { game_id: u64 },
    /// Show stored move secrets for your account
    Secrets {
        #[command(flatten)]
        connect: ConnectArgs,
    },
}

pub async fn handle_game_command(
    cmd: GameCommands,
    manager: &WalletManager,
    network: &NetworkConfig,
) -> Result<()> {
    match cmd {
        GameCommands::Create {
            connect,
            player_move,
            stake,
        } => {
            let stake = parse_stake(&stake)?;
            let session = connect_session(&connect, manager, network).await?;

            println!(
                "Creating game with {} and {} ETH stake...",
                player_move,
                format_stake(stake)
            );
            let view = session.create_game(player_move, stake).await?;

            println!("Game created! Your move secret is stored locally for the reveal.");
            print_game(&view);
            if let Some(game_id) = view.game_id {
                println!();
                println!("Invite an opponent: rps game share {}", game_id);
            }
            session.disconnect();
        }

        GameCommands::Join {
            connect,
            game_id,
            player_move,
        } => {
            let session = connect_session(&connect, manager, network).await?;

            println!("Joining game #{} with {}...", game_id, player_move);
            let view = session.join_game(game_id, player_move).await?;

            println!("Joined game #{}!", game_id);
            print_game(&view);
            session.disconnect();
        }

        GameCommands::Reveal {
            connect,
            game_id,
            player_move,
            salt,
        } => {
            let session = connect_session(&connect, manager, network).await?;

            let secret = match (player_move, salt) {
                (Some(player_move), Some(salt)) => {
                    let salt: B256 = salt
                        .trim()
                        .parse()
                        .map_err(|e| GameError::internal(format!("Invalid salt: {}", e)))?;
                    Some(CommitSecret::with_salt(player_move, salt, session.account())?)
                }
                _ => None,
            };

            println!("Revealing move for game #{}...", game_id);
            let view = session.reveal(game_id, secret).await?;

            println!("Move revealed!");
            print_game(&view);
            session.disconnect();
        }

        GameCommands::ClaimTimeout { connect, game_id } => {
            let session = connect_session(&connect, manager, network).await?;

            println!("Claiming timeout for game #{}...", game_id);
            let view = session.claim_timeout(game_id).await?;
            print_game(&view);
            session.disconnect();
        }

        GameCommands::Cancel { connect, game_id } => {
            let session = connect_session(&connect, manager, network).await?;

            println!("Cancelling game #{}...", game_id);
            let view = session.cancel_if_no_opponent(game_id).await?;
            print_game(&view);
            session.disconnect();
        }

        GameCommands::Status { connect, game_id } => {
            let view = match open_connector(&connect, manager).await? {
                Some(connector) => {
                    let session = Session::connect(network.clone(), connector, manager.storage()).await?;
                    let view = session.load_game(game_id).await;
                    session.disconnect();
                    view
                }
                None => {
                    let contract = spectator_contract(network)?;
                    GameView::resolve(game_id, contract.game(game_id).await, Address::ZERO)
                }
            };

            print_game(&view);
        }

        GameCommands::List {
            connect,
            joinable,
            mine,
        } => {
            let games = match open_connector(&connect, manager).await? {
                Some(connector) => {
                    let session = Session::connect(network.clone(), connector, manager.storage()).await?;
                    let games = session.list_games().await?;
                    session.disconnect();
                    games
                }
                None => {
                    let contract = spectator_contract(network)?;
                    fetch_games(&contract, Address::ZERO, network.game_list_window).await?
                }
            };

            let games: Vec<GameSummary> = games
                .into_iter()
                .filter(|g| (!joinable || g.can_join) && (!mine || g.is_my_game))
                .collect();

            print_game_list(&games);
        }

        GameCommands::Share { game_id } => {
            let links = ShareLinks::new(&network.share_base_url, game_id)?;

            println!("Share game #{}", game_id);
            println!();
            println!("  Link:     {}", links.game_url);
            println!("  Twitter:  {}", links.twitter);
            println!("  Telegram: {}", links.telegram);
            println!("  WhatsApp: {}", links.whatsapp);
            println!("  Discord:  {} (paste the link)", links.discord);
        }

        GameCommands::Secrets { connect } => {
            let session = connect_session(&connect, manager, network).await?;
            let storage = manager.storage();
            let secrets = CommitmentStore::new(&storage)
                .list_for_player(session.account())
                .await?;

            if secrets.is_empty() {
                println!("No stored move secrets for {}.", session.account());
                session.disconnect();
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Game", "Chain", "Move", "Salt", "Created"]);

            for data in secrets {
                let game = data
                    .game_id
                    .map(|id| format!("#{}", id))
                    .unwrap_or_else(|| "pending".to_string());
                let player_move = Move::try_from(data.move_raw)
                    .map(|m| m.to_string())
                    .unwrap_or_else(|_| data.move_raw.to_string());

                table.add_row(vec![
                    game,
                    data.chain_id.to_string(),
                    player_move,
                    data.salt.to_string(),
                    data.created_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }

            println!("{}", table);
            session.disconnect();
        }
    }

    Ok(())
}

async fn open_connector(
    connect: &ConnectArgs,
    manager: &WalletManager,
) -> Result<Option<Arc<dyn WalletConnector>>> {
    if let Some(name) = &connect.wallet {
        let password = read_password(false)?;
        let wallet: Arc<dyn WalletConnector> = manager.load_wallet(name, &password).await?;
        return Ok(Some(wallet));
    }

    if connect.injected {
        let connector = match &connect.account {
            Some(account) => NodeConnector::pinned(parse_address(account)?),
            None => NodeConnector::new(),
        };
        let connector: Arc<dyn WalletConnector> = Arc::new(connector);
        return Ok(Some(connector));
    }

    Ok(None)
}

async fn connect_session(
    connect: &ConnectArgs,
    manager: &WalletManager,
    network: &NetworkConfig,
) -> Result<Session> {
    let connector = open_connector(connect, manager).await?.ok_or_else(|| {
        CoreError::wallet("No wallet selected. Use --wallet <name> or --injected")
    })?;

    let session = Session::connect(network.clone(), connector, manager.storage()).await?;
    println!(
        "Using {} wallet {} on {}",
        session.connector_kind(),
        session.account(),
        network.name
    );
    Ok(session)
}

fn spectator_contract(network: &NetworkConfig) -> Result<RpsContract> {
    network.validate()?;
    Ok(RpsContract::new(network, RpcClient::new(&network.rpc_url)?))
}

fn print_game(view: &GameView) {
    let (Some(game_id), Some(record)) = (view.game_id, &view.record) else {
        match view.game_id {
            Some(game_id) => println!("Game #{} could not be loaded.", game_id),
            None => println!("No game yet."),
        }
        return;
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![format!("Game #{}", game_id), String::new()]);

    table.add_row(vec!["Phase".to_string(), view.phase.to_string()]);
    table.add_row(vec!["Player 1".to_string(), format_address(record.player1)]);
    table.add_row(vec!["Player 2".to_string(), format_address(record.player2)]);
    table.add_row(vec!["Stake".to_string(), format!("{} ETH", format_stake(record.stake))]);
    table.add_row(vec!["Created".to_string(), format_timestamp(record.created_at)]);
    table.add_row(vec![
        "Reveal deadline".to_string(),
        format_timestamp(record.reveal_deadline),
    ]);
    table.add_row(vec!["Player 1 move".to_string(), move_label(record.player1_move)]);
    table.add_row(vec!["Player 2 move".to_string(), move_label(record.player2_move)]);

    if let Some(winner) = view.winner {
        table.add_row(vec!["Result".to_string(), winner.to_string()]);
    }

    println!("{}", table);

    if view.my_turn {
        println!("Your turn: reveal with 'rps game reveal {}'", game_id);
    } else if view.can_join {
        println!("Open for joining: 'rps game join {} --move <move>'", game_id);
    } else if view.phase == Phase::Waiting {
        println!("Waiting for an opponent to join.");
    }
}

fn print_game_list(games: &[GameSummary]) {
    if games.is_empty() {
        println!("No games found.");
        println!("Create one with: rps game create --move rock --stake 0.01");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Player 1", "Player 2", "Stake", "Status", ""]);

    for game in games {
        let tag = if game.can_join {
            "Join"
        } else if game.is_my_game {
            "Yours"
        } else {
            ""
        };

        table.add_row(vec![
            format!("#{}", game.game_id),
            format_address(game.record.player1),
            format_address(game.record.player2),
            format!("{} ETH", format_stake(game.record.stake)),
            game.status.to_string(),
            tag.to_string(),
        ]);
    }

    println!("{}", table);
}

fn move_label(player_move: Move) -> String {
    if player_move.is_revealed() {
        format!("{} {}", player_move.icon(), player_move)
    } else {
        "Hidden".to_string()
    }
}
