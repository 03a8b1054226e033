use std::sync::Arc;

use quiz_core::SessionConfig;
use storage::catalog;
use storage::repository::{CourseRepository, Storage};

use crate::admin::AdminService;
use crate::error::AppServicesError;
use crate::sessions::SessionLoopService;
use crate::Clock;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    session_loop: Arc<SessionLoopService>,
    admin: Arc<AdminService>,
    seeded_catalog: bool,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, loading the bundled catalog
    /// into an empty database.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog setup
    /// fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: SessionConfig,
        admin_key: Option<String>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock, config, admin_key).await
    }

    /// # Errors
    ///
    /// Returns `AppServicesError` if catalog setup fails.
    pub async fn from_storage(
        storage: Storage,
        clock: Clock,
        config: SessionConfig,
        admin_key: Option<String>,
    ) -> Result<Self, AppServicesError> {
        let seeded_catalog = ensure_catalog(&storage).await?;

        let session_loop = Arc::new(SessionLoopService::new(
            clock,
            config,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.questions),
            Arc::clone(&storage.captures),
            Arc::clone(&storage.results),
        ));
        let admin = Arc::new(AdminService::new(
            admin_key,
            Arc::clone(&storage.captures),
            Arc::clone(&storage.results),
        ));

        Ok(Self {
            session_loop,
            admin,
            seeded_catalog,
        })
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }

    /// Whether startup loaded the bundled catalog into an empty store.
    #[must_use]
    pub fn seeded_catalog(&self) -> bool {
        self.seeded_catalog
    }
}

async fn ensure_catalog(storage: &Storage) -> Result<bool, AppServicesError> {
    let courses: &dyn CourseRepository = storage.courses.as_ref();
    if !courses.list_courses().await?.is_empty() {
        return Ok(false);
    }
    let entries = catalog::sample_catalog()?;
    let loaded = catalog::load_into(storage, &entries).await?;
    log::info!("loaded bundled catalog ({loaded} courses)");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;

    #[tokio::test]
    async fn empty_store_gets_the_bundled_catalog_once() {
        let storage = Storage::in_memory();
        let first = AppServices::from_storage(
            storage.clone(),
            fixed_clock(),
            SessionConfig::default(),
            None,
        )
        .await
        .unwrap();
        assert!(first.seeded_catalog());
        assert!(!first.session_loop().list_courses().await.unwrap().is_empty());

        let second =
            AppServices::from_storage(storage, fixed_clock(), SessionConfig::default(), None)
                .await
                .unwrap();
        assert!(!second.seeded_catalog());
        assert!(!second.admin().is_configured());
    }

    #[tokio::test]
    async fn every_bundled_course_can_be_started() {
        let services = AppServices::from_storage(
            Storage::in_memory(),
            fixed_clock(),
            SessionConfig::default(),
            None,
        )
        .await
        .unwrap();
        let courses = services.session_loop().list_courses().await.unwrap();
        assert_eq!(courses.len(), 6);
        for course in &courses {
            let active = services
                .session_loop()
                .start_session(course.id())
                .await
                .unwrap();
            assert_eq!(active.session().total_questions(), 10);
            assert_ne!(
                active.course().study_plan_link(),
                quiz_core::model::DEFAULT_STUDY_PLAN_URL
            );
        }
    }
}
