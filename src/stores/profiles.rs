//! Role profiles and the registration flows that create them.
//!
//! Shoppers register in a single step. Farmers, artisans and industry
//! buyers register in two: the contact step is kept as scratch under the
//! role's registration key, and completing the profile assigns the
//! sequential id, writes the profile and drops the scratch.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::domain::aggregates::{
    ArtisanContact, ArtisanDetails, ArtisanProfile, ArtisanRegistration, FarmerContact, FarmerDetails, FarmerProfile,
    FarmerRegistration, IndustryContact, IndustryDetails, IndustryProfile, IndustryRegistration, Role, RoleProfile,
    UserDetails, UserProfile, UserRegistration,
};
use crate::domain::events::{DomainEvent, ProfileEvent};
use crate::session::Session;
use crate::storage::{keys, Document};
use crate::{MarketplaceError, Result};

#[derive(Clone, Debug)]
pub struct ProfileStore {
    session: Session,
}

impl ProfileStore {
    pub fn new(session: Session) -> Self { Self { session } }

    fn document<P: RoleProfile>(&self) -> Document<Option<P>> { self.session.document(keys::profile(P::ROLE)) }

    fn scratch<C>(&self, role: Role) -> Document<Option<C>>
    where
        C: Serialize + DeserializeOwned + Send + Sync,
    {
        self.session.document(keys::registration(role))
    }

    pub async fn get<P: RoleProfile>(&self) -> Result<Option<P>> {
        Ok(self.document::<P>().load().await?)
    }

    /// Gate for a role's home surface.
    pub async fn require<P: RoleProfile>(&self) -> Result<P> {
        self.get::<P>().await?.ok_or(MarketplaceError::ProfileRequired(P::ROLE))
    }

    /// Overwrites the stored profile as a whole.
    pub async fn save<P: RoleProfile>(&self, profile: &P) -> Result<()> {
        profile.validate()?;
        self.document::<P>().replace(&Some(profile.clone())).await?;
        Ok(())
    }

    /// Logout. Also drops any unfinished registration for the role.
    pub async fn remove(&self, role: Role) -> Result<()> {
        let profile = keys::profile(role);
        self.session.document::<Option<serde_json::Value>>(profile).remove().await?;
        self.scratch::<serde_json::Value>(role).remove().await?;
        info!(namespace = self.session.namespace(), %role, "profile removed");
        self.session.publish(vec![DomainEvent::Profile(ProfileEvent::Removed { role })]).await;
        Ok(())
    }

    async fn next_user_id(&self, role: Role) -> Result<String> {
        let sequence = self.session.next_sequence(&keys::user_counter(role)).await?;
        Ok(role.user_id(sequence))
    }

    async fn registered<P: RoleProfile>(&self, profile: P) -> Result<P> {
        self.save(&profile).await?;
        info!(namespace = self.session.namespace(), role = %P::ROLE, user_id = profile.user_id(), "profile registered");
        let event = ProfileEvent::Registered { role: P::ROLE, user_id: profile.user_id().to_string() };
        self.session.publish(vec![DomainEvent::Profile(event)]).await;
        Ok(profile)
    }

    async fn begin<C>(&self, role: Role, contact: C) -> Result<()>
    where
        C: Serialize + DeserializeOwned + Send + Sync,
    {
        self.scratch::<C>(role).replace(&Some(contact)).await?;
        Ok(())
    }

    async fn finish<C, P>(&self, build: impl FnOnce(String, C) -> P) -> Result<P>
    where
        C: Serialize + DeserializeOwned + Send + Sync,
        P: RoleProfile,
    {
        let scratch = self.scratch::<C>(P::ROLE);
        let contact = scratch.load().await?.ok_or(MarketplaceError::RegistrationNotStarted(P::ROLE))?;
        let user_id = self.next_user_id(P::ROLE).await?;
        let profile = self.registered(build(user_id, contact)).await?;
        scratch.remove().await?;
        Ok(profile)
    }

    pub async fn pending_registration<C>(&self, role: Role) -> Result<Option<C>>
    where
        C: Serialize + DeserializeOwned + Send + Sync,
    {
        Ok(self.scratch::<C>(role).load().await?)
    }

    // =========================================================================
    // User
    // =========================================================================

    pub async fn register_user(&self, registration: UserRegistration) -> Result<UserProfile> {
        registration.validate()?;
        let user_id = self.next_user_id(Role::User).await?;
        let profile = UserProfile::register(registration, user_id)
            .ok_or_else(|| MarketplaceError::invalid("contact", "contact_must_be_email_or_phone"))?;
        self.registered(profile).await
    }

    /// Replaces the editable details and keeps identity fields.
    pub async fn update_user_details(&self, details: UserDetails) -> Result<UserProfile> {
        details.validate()?;
        let (_, profile) = self.document::<UserProfile>()
            .update::<_, MarketplaceError, _>(|stored| {
                let profile = stored.as_mut().ok_or(MarketplaceError::ProfileRequired(Role::User))?;
                profile.details = details.clone();
                Ok(profile.clone())
            })
            .await?;
        Ok(profile)
    }

    // =========================================================================
    // Farmer
    // =========================================================================

    pub async fn start_farmer_registration(&self, registration: FarmerRegistration) -> Result<()> {
        registration.validate()?;
        self.begin::<FarmerContact>(Role::Farmer, registration.contact).await
    }

    pub async fn complete_farmer_registration(&self, details: FarmerDetails) -> Result<FarmerProfile> {
        details.validate()?;
        self.finish(|user_id, contact: FarmerContact| FarmerProfile { user_id, contact, details, registered_at: Utc::now() }).await
    }

    // =========================================================================
    // Artisan
    // =========================================================================

    /// The password is checked here and never stored.
    pub async fn start_artisan_registration(&self, registration: ArtisanRegistration) -> Result<()> {
        registration.validate()?;
        self.begin(Role::Artisan, ArtisanContact::from(registration)).await
    }

    pub async fn complete_artisan_registration(&self, details: ArtisanDetails) -> Result<ArtisanProfile> {
        details.validate()?;
        self.finish(|user_id, contact: ArtisanContact| ArtisanProfile { user_id, contact, details, registered_at: Utc::now() }).await
    }

    // =========================================================================
    // Industry
    // =========================================================================

    pub async fn start_industry_registration(&self, registration: IndustryRegistration) -> Result<()> {
        registration.validate()?;
        self.begin::<IndustryContact>(Role::Industry, registration.contact).await
    }

    pub async fn complete_industry_registration(&self, details: IndustryDetails) -> Result<IndustryProfile> {
        details.validate()?;
        self.finish(|user_id, contact: IndustryContact| IndustryProfile { user_id, contact, details, registered_at: Utc::now() }).await
    }
}
