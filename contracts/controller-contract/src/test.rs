#![cfg(test)]

use super::*;
use debt_token_contract::{DebtTokenContract, DebtTokenContractClient};
use market_contract::{MarketContract, MarketContractClient};
use soroban_sdk::{testutils::Address as _, token, Address, BytesN, Env, String};

// ─────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────

const UNIT: i128 = 1_000_000_000_000_000_000;

fn create_debt_token<'a>(env: &'a Env, admin: &Address) -> DebtTokenContractClient<'a> {
    let token_id = env.register_contract(None, DebtTokenContract);
    let client = DebtTokenContractClient::new(env, &token_id);
    client.initialize(
        admin,
        &18u32,
        &String::from_str(env, "Test ETH"),
        &String::from_str(env, "tETH"),
        &0i128,
    );
    client
}

fn setup(env: &Env) -> (ControllerContractClient<'_>, DebtTokenContractClient<'_>, Address) {
    let admin = Address::generate(env);
    let debt = create_debt_token(env, &admin);
    let burner = Address::generate(env);

    let contract_id = env.register_contract(None, ControllerContract);
    let client = ControllerContractClient::new(env, &contract_id);
    // The blueprint hash is the installed market wasm on a live network;
    // an arbitrary hash is enough for everything short of deployment.
    let wasm_hash = BytesN::from_array(env, &[7u8; 32]);
    client.initialize(&admin, &debt.address, &burner, &wasm_hash);

    // Hand the controller the debt token's controller role so it can
    // pre-fund the markets it deploys.
    debt.set_controller(&admin, &contract_id);

    (client, debt, admin)
}

/// Register a market instance directly, the way the factory wires one up.
fn register_market<'a>(
    env: &'a Env,
    admin: &Address,
    collat: &Address,
    debt: &DebtTokenContractClient,
    burner: &Address,
) -> MarketContractClient<'a> {
    let contract_id = env.register_contract(None, MarketContract);
    let market = MarketContractClient::new(env, &contract_id);
    market.initialize(
        admin,
        collat,
        &debt.address,
        &9000u32,
        &UNIT,
        &(1_000 * UNIT),
        &1i128,
        &false,
        burner,
    );
    debt.mint_to(admin, &contract_id, &(1_000 * UNIT));
    market
}

// ─────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────

#[test]
fn test_initialize_once() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, debt, admin) = setup(&env);

    let burner = Address::generate(&env);
    let wasm_hash = BytesN::from_array(&env, &[7u8; 32]);
    let result = client.try_initialize(&admin, &debt.address, &burner, &wasm_hash);
    assert!(result.is_err());
}

#[test]
fn test_registry_starts_empty() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, _debt, admin) = setup(&env);

    assert_eq!(client.market_count(), 0);
    assert_eq!(client.get_markets().len(), 0);
    assert_eq!(client.get_admin(), admin);
}

#[test]
fn test_deploy_market_from_hacker() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, _debt, _admin) = setup(&env);

    let hacker = Address::generate(&env);
    let collat = Address::generate(&env);
    let market_admin = Address::generate(&env);
    let salt = BytesN::from_array(&env, &[1u8; 32]);

    let result = client.try_deploy_market(
        &hacker,
        &salt,
        &market_admin,
        &collat,
        &9000u32,
        &UNIT,
        &(1_000 * UNIT),
        &1i128,
        &false,
        &(1_000 * UNIT),
    );
    assert!(result.is_err());
    assert_eq!(client.market_count(), 0);
}

#[test]
fn test_deploy_market_with_negative_funding() {
    let env = Env::default();
    env.mock_all_auths();
    let (client, _debt, admin) = setup(&env);

    let collat = Address::generate(&env);
    let salt = BytesN::from_array(&env, &[1u8; 32]);
    let result = client.try_deploy_market(
        &admin,
        &salt,
        &admin,
        &collat,
        &9000u32,
        &UNIT,
        &(1_000 * UNIT),
        &1i128,
        &false,
        &(-1i128),
    );
    assert!(result.is_err());
}

#[test]
fn test_uninitialized_controller_rejects_queries() {
    let env = Env::default();
    env.mock_all_auths();

    let contract_id = env.register_contract(None, ControllerContract);
    let client = ControllerContractClient::new(&env, &contract_id);

    assert!(client.try_market_count().is_err());
    assert!(client.try_get_markets().is_err());
    assert!(client.try_get_admin().is_err());
}

#[test]
fn test_market_instances_are_isolated() {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let debt = create_debt_token(&env, &admin);
    let burner = Address::generate(&env);

    let collat_admin = Address::generate(&env);
    let collat = env
        .register_stellar_asset_contract_v2(collat_admin)
        .address();

    let market_a = register_market(&env, &admin, &collat, &debt, &burner);
    let market_b = register_market(&env, &admin, &collat, &debt, &burner);

    let borrower = Address::generate(&env);
    token::StellarAssetClient::new(&env, &collat).mint(&borrower, &(2 * UNIT));
    let live_until = env.ledger().sequence() + 1000;
    token::Client::new(&env, &collat).approve(&borrower, &market_a.address, &(2 * UNIT), &live_until);

    market_a.open_loan(&borrower, &UNIT, &5i128);

    // The sibling market sees none of it: no loan, untouched counters,
    // and pausing it leaves the first market running.
    assert!(market_a.has_loan(&borrower));
    assert!(!market_b.has_loan(&borrower));
    assert_eq!(market_a.get_state().total_loans, 1);
    assert_eq!(market_b.get_state().total_loans, 0);
    assert_eq!(market_b.get_state().total_collateral, 0);

    market_b.toggle_pause(&admin);
    market_a.add_to_loan(&borrower, &UNIT, &0i128);
    assert_eq!(market_a.get_loan(&borrower).collateral, 2 * UNIT);
}
