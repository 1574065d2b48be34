//! Application state.
//!
//! Every service is wired by an explicit constructor call in `setup::services`
//! at process start. Handlers receive the whole state; the domain is small
//! enough that sub-state splitting would be noise.

use livraria_cache::SweeperHandle;
use livraria_core::Config;
use livraria_services::{
    AuthService, AuthorService, CategoryService, PasswordRecoveryService, ProductService,
    PublisherService, UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub auth: AuthService,
    pub authors: AuthorService,
    pub categories: CategoryService,
    pub publishers: PublisherService,
    pub products: ProductService,
    pub users: UserService,
    pub recovery: PasswordRecoveryService,
    pub cache_sweeper: SweeperHandle,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
