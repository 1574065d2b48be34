//! Service and repository wiring. Everything is constructed explicitly here,
//! once, at process start.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use livraria_cache::TtlCache;
use livraria_cdn::{CdnClient, ImagePipeline};
use livraria_core::Config;
use livraria_db::{
    AuthorRepository, CategoryRepository, PasswordResetRepository, ProductRepository,
    PublisherRepository, RoleRepository, UserRepository,
};
use livraria_services::{
    AuthService, AuthorService, CategoryService, EmailService, PasswordRecoveryService,
    ProductService, PublisherService, UserService,
};

use crate::state::AppState;

pub fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    // Repositories
    let author_repo = AuthorRepository::new(pool.clone());
    let category_repo = CategoryRepository::new(pool.clone());
    let publisher_repo = PublisherRepository::new(pool.clone());
    let product_repo = ProductRepository::new(pool.clone());
    let user_repo = UserRepository::new(pool.clone());
    let role_repo = RoleRepository::new(pool.clone());
    let reset_repo = PasswordResetRepository::new(pool.clone());

    // Image pipeline: remote store client fronted by the lookup cache.
    let cdn = CdnClient::new(&config.cdn)?;
    let lookup_cache: TtlCache<String> =
        TtlCache::new(config.cache.max_entries, config.cache.default_ttl);
    let cache_sweeper = lookup_cache.spawn_sweeper(config.cache.sweep_interval);
    let pipeline = Arc::new(ImagePipeline::new(
        Arc::new(cdn),
        config.image.clone(),
        lookup_cache,
    ));

    // Outbound email; absent when disabled.
    let email = EmailService::from_config(&config.smtp)?;
    if email.is_none() {
        tracing::warn!("Outbound email disabled; password recovery emails will not be sent");
    }

    let auth = AuthService::new(
        pool.clone(),
        user_repo.clone(),
        role_repo.clone(),
        config.auth.clone(),
    )?;
    let recovery = PasswordRecoveryService::new(
        user_repo.clone(),
        reset_repo,
        email,
        config.recovery.clone(),
    );

    let state = AppState {
        config: config.clone(),
        pool: pool.clone(),
        auth,
        authors: AuthorService::new(author_repo.clone(), pipeline.clone()),
        categories: CategoryService::new(category_repo.clone()),
        publishers: PublisherService::new(publisher_repo.clone()),
        products: ProductService::new(
            pool.clone(),
            product_repo,
            category_repo,
            publisher_repo,
            author_repo,
            pipeline.clone(),
        ),
        users: UserService::new(pool, user_repo, role_repo, pipeline),
        recovery,
        cache_sweeper,
    };

    tracing::info!("Services initialized");
    Ok(Arc::new(state))
}
