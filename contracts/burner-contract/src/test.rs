#![cfg(test)]

use super::*;
use debt_token_contract::{DebtTokenContract, DebtTokenContractClient};
use soroban_sdk::{testutils::Address as _, Address, Env, String};

// ─────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────

fn create_debt_token<'a>(env: &'a Env, admin: &Address) -> (Address, DebtTokenContractClient<'a>) {
    let token_id = env.register_contract(None, DebtTokenContract);
    let token = DebtTokenContractClient::new(env, &token_id);
    token.initialize(
        admin,
        &18u32,
        &String::from_str(env, "Test ETH"),
        &String::from_str(env, "tETH"),
        &1_000_000i128,
    );
    (token_id, token)
}

fn setup(env: &Env) -> (BurnerContractClient<'_>, DebtTokenContractClient<'_>, Address) {
    let admin = Address::generate(env);
    let (token_id, token) = create_debt_token(env, &admin);

    let burner_id = env.register_contract(None, BurnerContract);
    let burner = BurnerContractClient::new(env, &burner_id);
    burner.initialize(&token_id);
    token.set_burner(&admin, &burner_id);

    (burner, token, admin)
}

// ─────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────

#[test]
fn test_initialize_once() {
    let env = Env::default();
    env.mock_all_auths();
    let (burner, token, _admin) = setup(&env);

    let result = burner.try_initialize(&token.address);
    assert!(result.is_err());
}

#[test]
fn test_nothing_to_burn() {
    let env = Env::default();
    env.mock_all_auths();
    let (burner, _token, _admin) = setup(&env);

    let caller = Address::generate(&env);
    let result = burner.try_burn(&caller);
    assert!(result.is_err());
}

#[test]
fn test_balance_updates_on_burn() {
    let env = Env::default();
    env.mock_all_auths();
    let (burner, token, admin) = setup(&env);

    let amount = 10_000i128;
    token.transfer(&admin, &burner.address, &amount);
    assert_eq!(burner.balance(), amount);

    let caller = Address::generate(&env);
    let burned = burner.burn(&caller);
    assert_eq!(burned, amount);
    assert_eq!(token.balance(&burner.address), 0);
    assert_eq!(burner.balance(), 0);
}

#[test]
fn test_burn_twice_fails_second_time() {
    let env = Env::default();
    env.mock_all_auths();
    let (burner, token, admin) = setup(&env);

    token.transfer(&admin, &burner.address, &500i128);
    let caller = Address::generate(&env);
    burner.burn(&caller);

    let result = burner.try_burn(&caller);
    assert!(result.is_err());
}

#[test]
fn test_uninitialized_burner_rejects_burn() {
    let env = Env::default();
    env.mock_all_auths();

    let burner_id = env.register_contract(None, BurnerContract);
    let burner = BurnerContractClient::new(&env, &burner_id);

    let caller = Address::generate(&env);
    let result = burner.try_burn(&caller);
    assert!(result.is_err());
}
