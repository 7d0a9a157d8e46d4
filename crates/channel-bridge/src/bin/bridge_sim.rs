//! # Bridge Simulator
//!
//! Runs the channel bridge over in-memory adapters and plays two channels
//! end to end:
//!
//! 1. **Settled** - three participants deposit 10 each, the leader proves
//!    the tree, a transfer chain and conservation, everyone withdraws.
//! 2. **Timed out** - the leader never settles; a participant slashes the
//!    bond after the deadline and everyone leaves through the emergency exit.
//!
//! Logging follows `BRIDGE_LOG_LEVEL` / `BRIDGE_JSON_LOGS`. Pass `--metrics`
//! to print the Prometheus export at the end.

use anyhow::{ensure, Context, Result};
use bridge_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use channel_bridge::scenario::{participants, Harness, LEADER, OWNER, TOKEN_A, TREASURY};
use channel_bridge::{ChannelId, ChannelState, TokenGateway};
use shared_types::{address_from_byte, short_hex, Address, Amount};
use tracing::info;

const DEPOSIT: Amount = 10;
const HOUR: u64 = 3600;

fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env()).context("telemetry init")?;

    let harness = Harness::new().context("bridge config")?;
    harness.register_transfer_circuit()?;

    let settled = settled_channel(&harness).context("settled channel")?;
    let timed_out = timed_out_channel(&harness).context("timed-out channel")?;

    let swept = harness.bridge.withdraw_treasury(OWNER)?;
    info!(
        "[sim] Channels {} and {} done; treasury {} swept {}",
        settled,
        timed_out,
        short_hex(&TREASURY),
        swept
    );

    if std::env::args().any(|arg| arg == "--metrics") {
        println!("{}", encode_metrics()?);
    }
    Ok(())
}

fn settled_channel(harness: &Harness) -> Result<ChannelId> {
    let members = participants(3);
    let (id, keys) = harness.open_channel(LEADER, &members, &[TOKEN_A], HOUR)?;
    for member in &members {
        harness.deposit(id, TOKEN_A, *member, DEPOSIT)?;
    }

    // Participant 0 pays 4 to participant 2 off-ledger.
    let final_balances = vec![vec![DEPOSIT - 4, DEPOSIT, DEPOSIT + 4]];
    harness.settle(id, &keys, &final_balances)?;
    ensure!(
        harness.bridge.channel_state(id) == ChannelState::Closed,
        "channel {} did not close",
        id
    );

    for (member, expected) in members.iter().zip(&final_balances[0]) {
        let paid = harness.bridge.withdraw(*member, id, TOKEN_A)?;
        ensure!(paid == *expected, "{} received {} instead of {}", short_hex(member), paid, expected);
    }

    let window = harness.bridge.config().dispute_window;
    harness.clock.advance_time(window + 1);
    let bond = harness.bridge.reclaim_leader_bond(LEADER, id)?;
    info!("[sim] Channel {} settled, leader reclaimed bond {}", id, bond);
    Ok(id)
}

fn timed_out_channel(harness: &Harness) -> Result<ChannelId> {
    let leader: Address = address_from_byte(0x02);
    let members = participants(3);
    let (id, _keys) = harness.open_channel(leader, &members, &[TOKEN_A], HOUR)?;
    for member in &members {
        harness.deposit(id, TOKEN_A, *member, DEPOSIT)?;
    }

    let deadline = harness.bridge.settlement_deadline(id)?;
    harness.clock.set_time(deadline + 1);
    harness.bridge.handle_proof_timeout(members[0], id)?;

    for member in &members {
        let payouts = harness.bridge.emergency_withdraw(*member, id)?;
        let recovered: Amount = payouts.iter().map(|(_, amount)| amount).sum();
        ensure!(recovered == DEPOSIT, "{} recovered {}", short_hex(member), recovered);
        let balance = harness.tokens.balance_of(&TOKEN_A, member)?;
        info!(
            "[sim] {} recovered {} (balance {})",
            short_hex(member),
            recovered,
            balance
        );
    }
    Ok(id)
}
