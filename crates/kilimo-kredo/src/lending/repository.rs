use std::sync::{Arc, Mutex};

use super::domain::{ApplicationId, ApplicationStatus, FarmerProfile, LoanApplication};
use super::store::{load_as, save_as, KeyValueStore, StoreError, APPLICATIONS_KEY, PROFILE_KEY};

/// Storage abstraction for the single active farmer profile.
pub trait ProfileRepository: Send + Sync {
    fn load(&self) -> Result<Option<FarmerProfile>, RepositoryError>;
    fn save(&self, profile: FarmerProfile) -> Result<(), RepositoryError>;
}

/// Per-record storage for loan applications. `list` preserves submission order.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: LoanApplication) -> Result<LoanApplication, RepositoryError>;
    fn update(&self, application: LoanApplication) -> Result<(), RepositoryError>;
    /// Apply `edit` to the stored application as one atomic step and return the result.
    ///
    /// `edit` returns whether anything changed; nothing is written when it returns `false` or
    /// an error. A missing id yields `RepositoryError::NotFound` converted into `E`.
    fn transition<E, F>(&self, id: &ApplicationId, edit: F) -> Result<LoanApplication, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut LoanApplication) -> Result<bool, E>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError>;
    fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<LoanApplication>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for RepositoryError {
    fn from(value: StoreError) -> Self {
        Self::Unavailable(value.to_string())
    }
}

/// Profile repository over the `farmerProfile` key.
pub struct StoreProfileRepository<S: ?Sized> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> StoreProfileRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore + ?Sized> ProfileRepository for StoreProfileRepository<S> {
    fn load(&self) -> Result<Option<FarmerProfile>, RepositoryError> {
        Ok(load_as(self.store.as_ref(), PROFILE_KEY)?)
    }

    fn save(&self, profile: FarmerProfile) -> Result<(), RepositoryError> {
        Ok(save_as(self.store.as_ref(), PROFILE_KEY, &profile)?)
    }
}

/// Application repository over the `loanApplications` key.
///
/// Every mutation reads the whole collection, edits it, and writes it back while holding
/// `write_lock`, so two callers in this process cannot lose each other's update. Checks that
/// must hold at write time belong inside [`ApplicationRepository::transition`].
pub struct StoreApplicationRepository<S: ?Sized> {
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore + ?Sized> StoreApplicationRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        let stored: Option<Vec<LoanApplication>> =
            load_as(self.store.as_ref(), APPLICATIONS_KEY)?;
        Ok(stored.unwrap_or_default())
    }

    fn write_all(&self, applications: &[LoanApplication]) -> Result<(), RepositoryError> {
        Ok(save_as(self.store.as_ref(), APPLICATIONS_KEY, &applications)?)
    }

    fn modify<T>(
        &self,
        edit: impl FnOnce(&mut Vec<LoanApplication>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::Unavailable("write lock poisoned".to_string()))?;
        let mut applications = self.read_all()?;
        let outcome = edit(&mut applications)?;
        self.write_all(&applications)?;
        Ok(outcome)
    }
}

impl<S: KeyValueStore + ?Sized> ApplicationRepository for StoreApplicationRepository<S> {
    fn insert(&self, application: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        self.modify(|applications| {
            if applications
                .iter()
                .any(|existing| existing.application_id == application.application_id)
            {
                return Err(RepositoryError::Conflict);
            }
            applications.push(application.clone());
            Ok(application)
        })
    }

    fn update(&self, application: LoanApplication) -> Result<(), RepositoryError> {
        self.modify(|applications| {
            let slot = applications
                .iter_mut()
                .find(|existing| existing.application_id == application.application_id)
                .ok_or(RepositoryError::NotFound)?;
            *slot = application;
            Ok(())
        })
    }

    fn transition<E, F>(&self, id: &ApplicationId, edit: F) -> Result<LoanApplication, E>
    where
        E: From<RepositoryError>,
        F: FnOnce(&mut LoanApplication) -> Result<bool, E>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::Unavailable("write lock poisoned".to_string()))?;
        let mut applications = self.read_all()?;
        let slot = applications
            .iter_mut()
            .find(|application| &application.application_id == id)
            .ok_or(RepositoryError::NotFound)?;

        if edit(slot)? {
            let edited = slot.clone();
            self.write_all(&applications)?;
            Ok(edited)
        } else {
            Ok(slot.clone())
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|application| &application.application_id == id))
    }

    fn list(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<LoanApplication>, RepositoryError> {
        let applications = self.read_all()?;
        Ok(match status {
            Some(status) => applications
                .into_iter()
                .filter(|application| application.status == status)
                .collect(),
            None => applications,
        })
    }
}
