use crate::infra::{
    seed_portfolio, InMemoryPublicationStore, LEGACY_LISTING, LINKED_LISTING, PENDING_LISTING,
    SIGNED_LISTING, UNDOCUMENTED_LISTING,
};
use brokerage_desk::config::PublicationConfig;
use brokerage_desk::error::AppError;
use brokerage_desk::workflows::publication::{
    ActorRole, LegacyAuthorizationLookup, ListingId, PublicationDecision, PublicationService,
    PublicationStore,
};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Require a signed digital authorization; legacy documents no longer count.
    #[arg(long)]
    pub(crate) require_digital: bool,
    /// Evaluate a single seeded listing instead of the whole portfolio.
    #[arg(long)]
    pub(crate) listing: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        require_digital,
        listing,
    } = args;

    let store = Arc::new(InMemoryPublicationStore::default());
    store.set_digital_authorization_required(require_digital);
    seed_portfolio(&store);
    let service = PublicationService::standard(store.clone(), &PublicationConfig::default());

    println!("Listing publication gate demo");
    println!(
        "- digital authorization {}",
        if require_digital {
            "required"
        } else {
            "optional (legacy documents accepted)"
        }
    );

    let listings = match listing {
        Some(id) => vec![id],
        None => [
            SIGNED_LISTING,
            LEGACY_LISTING,
            UNDOCUMENTED_LISTING,
            PENDING_LISTING,
            LINKED_LISTING,
        ]
        .iter()
        .map(|id| id.to_string())
        .collect(),
    };

    for id in &listings {
        let id = ListingId(id.clone());
        match service.can_publish(&id) {
            Ok(decision) => render_decision(&id, &decision),
            Err(err) => println!("\n{id}: evaluation unavailable ({err})"),
        }
    }

    if listings.iter().any(|id| id == SIGNED_LISTING) {
        let id = ListingId(SIGNED_LISTING.to_string());
        println!("\nRaising the asking price of {id} after its authorization was signed");
        store.update_listing(&id, |listing| {
            listing.sale_price = listing.sale_price.map(|price| price * 1.1)
        });
        let decision = service.can_publish(&id)?;
        render_decision(&id, &decision);
        attempt_publish(&service, &id);
    }

    Ok(())
}

fn render_decision(id: &ListingId, decision: &PublicationDecision) {
    let authorization = &decision.authorization;
    println!(
        "\n{id}: {}",
        if decision.allowed {
            "ready to publish"
        } else {
            "blocked"
        }
    );
    println!(
        "  authorization: {} (source {:?}, status {})",
        authorization.has_authorization,
        authorization.source,
        authorization.status.as_deref().unwrap_or("-")
    );
    if let Some(instance) = &authorization.document_instance_id {
        println!("  document instance: {}", instance.0);
    }
    if !authorization.changed_fields.is_empty() {
        println!(
            "  changed since signature: {}",
            authorization.changed_fields.join(", ")
        );
    }
    println!("  media attached: {}", decision.media_count);
    for reason in &decision.reasons {
        println!("  - {reason}");
    }
}

fn attempt_publish<S, L>(service: &PublicationService<S, L>, id: &ListingId)
where
    S: PublicationStore + 'static,
    L: LegacyAuthorizationLookup + 'static,
{
    match service.publish(id, ActorRole::Manager) {
        Ok(change) => println!("  publish as manager: now {}", change.status.label()),
        Err(err) => println!("  publish as manager refused: {err}"),
    }
}
