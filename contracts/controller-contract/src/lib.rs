#![no_std]
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, vec, Address, BytesN,
    Env, IntoVal, Symbol, Val, Vec,
};

mod test;

// ─────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketDeployedEvent {
    pub market: Address,
    pub market_admin: Address,
    pub collateral_token: Address,
}

// ─────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────

#[contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControllerError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    InvalidAmount = 4,
}

// ─────────────────────────────────────────────────
// Storage Keys
// ─────────────────────────────────────────────────

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    DebtToken,
    Burner,
    MarketWasm,
    Markets,
}

// ─────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────

/// Factory for market instances. Holds the market blueprint (an uploaded
/// wasm hash) plus the shared debt token and burner, and stamps out fully
/// independent markets wired to them. The controller is expected to hold
/// the debt token's controller role so it can pre-fund each new market's
/// payout balance.
#[contract]
pub struct ControllerContract;

#[contractimpl]
impl ControllerContract {
    // ─── Admin / Init ───────────────────────────────

    /// Store the blueprint and shared collaborators. Can only be called once.
    pub fn initialize(
        env: Env,
        admin: Address,
        debt_token: Address,
        burner: Address,
        market_wasm_hash: BytesN<32>,
    ) -> Result<(), ControllerError> {
        admin.require_auth();
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(ControllerError::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::DebtToken, &debt_token);
        env.storage().instance().set(&DataKey::Burner, &burner);
        env.storage()
            .instance()
            .set(&DataKey::MarketWasm, &market_wasm_hash);
        env.storage()
            .instance()
            .set(&DataKey::Markets, &Vec::<Address>::new(&env));
        Ok(())
    }

    fn require_initialized(env: &Env) -> Result<(), ControllerError> {
        if !env.storage().instance().has(&DataKey::Admin) {
            return Err(ControllerError::NotInitialized);
        }
        Ok(())
    }

    fn admin(env: &Env) -> Address {
        env.storage().instance().get(&DataKey::Admin).unwrap()
    }

    fn require_admin(env: &Env, caller: &Address) -> Result<(), ControllerError> {
        caller.require_auth();
        if *caller != Self::admin(env) {
            return Err(ControllerError::Unauthorized);
        }
        Ok(())
    }

    fn markets(env: &Env) -> Vec<Address> {
        env.storage().instance().get(&DataKey::Markets).unwrap()
    }

    // ─── Deployment ─────────────────────────────────

    /// Instantiate a new market from the blueprint. Admin only. Each call
    /// with a distinct salt yields a fresh, state-isolated instance; there
    /// is no dedup. `initial_debt_funding` is minted straight to the new
    /// market so it can pay out borrows.
    #[allow(clippy::too_many_arguments)]
    pub fn deploy_market(
        env: Env,
        caller: Address,
        salt: BytesN<32>,
        market_admin: Address,
        collateral_token: Address,
        max_ltv_bps: u32,
        min_collateral: i128,
        max_borrow: i128,
        price_unit: i128,
        whitelist_enabled: bool,
        initial_debt_funding: i128,
    ) -> Result<Address, ControllerError> {
        Self::require_initialized(&env)?;
        Self::require_admin(&env, &caller)?;
        if initial_debt_funding < 0 {
            return Err(ControllerError::InvalidAmount);
        }

        let debt_token: Address = env.storage().instance().get(&DataKey::DebtToken).unwrap();
        let burner: Address = env.storage().instance().get(&DataKey::Burner).unwrap();
        let wasm_hash: BytesN<32> = env.storage().instance().get(&DataKey::MarketWasm).unwrap();

        let market = env
            .deployer()
            .with_current_contract(salt)
            .deploy_v2(wasm_hash, ());

        let init_args: Vec<Val> = vec![
            &env,
            market_admin.clone().into_val(&env),
            collateral_token.clone().into_val(&env),
            debt_token.clone().into_val(&env),
            max_ltv_bps.into_val(&env),
            min_collateral.into_val(&env),
            max_borrow.into_val(&env),
            price_unit.into_val(&env),
            whitelist_enabled.into_val(&env),
            burner.into_val(&env),
        ];
        env.invoke_contract::<()>(&market, &Symbol::new(&env, "initialize"), init_args);

        if initial_debt_funding > 0 {
            let mint_args: Vec<Val> = vec![
                &env,
                env.current_contract_address().into_val(&env),
                market.clone().into_val(&env),
                initial_debt_funding.into_val(&env),
            ];
            env.invoke_contract::<()>(&debt_token, &Symbol::new(&env, "mint_to"), mint_args);
        }

        let mut markets = Self::markets(&env);
        markets.push_back(market.clone());
        env.storage().instance().set(&DataKey::Markets, &markets);

        env.events().publish(
            (symbol_short!("CTRL"), symbol_short!("DEPLOY")),
            MarketDeployedEvent {
                market: market.clone(),
                market_admin,
                collateral_token,
            },
        );
        log!(&env, "Deployed market {}", market);
        Ok(market)
    }

    // ─── Read-only ──────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, ControllerError> {
        Self::require_initialized(&env)?;
        Ok(Self::admin(&env))
    }

    pub fn get_markets(env: Env) -> Result<Vec<Address>, ControllerError> {
        Self::require_initialized(&env)?;
        Ok(Self::markets(&env))
    }

    pub fn market_count(env: Env) -> Result<u32, ControllerError> {
        Self::require_initialized(&env)?;
        Ok(Self::markets(&env).len())
    }
}
