use serde::Serialize;

use crate::entities::location::GeoPoint;
use crate::entities::route::Route;
use crate::entities::tenant::Tenant;
use crate::entities::user::UserRole;
use crate::utils::geo::haversine_distance;

/// Round to whole cents. Applied when a price leaves the resolver, never
/// between intermediate steps.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn markup_factor(tenant: &Tenant) -> Option<f64> {
    tenant
        .markup_percent
        .map(|percent| 1.0 + percent.clamp(0.0, 100.0) / 100.0)
}

/// Unit price one adult seat costs the requesting user: corporate markup
/// over the base price, else the tenant's per-route surcharge, else the
/// base price as published.
pub fn price_for_user(route: &Route, role: UserRole, tenant: &Tenant) -> f64 {
    if role == UserRole::CorporateCustomer {
        if let Some(factor) = markup_factor(tenant) {
            return round_money(route.base_price * factor);
        }
    }
    match route.surcharges.get(&tenant.id) {
        Some(surcharge) => route.base_price + surcharge,
        None => route.base_price,
    }
}

pub fn child_price(route: &Route) -> Option<f64> {
    route.child_price
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quote {
    pub adult_price: f64,
    pub child_price: Option<f64>,
    pub adults: u32,
    pub children: u32,
    pub total: f64,
}

/// Full price breakdown for a route booking. Deterministic and
/// side-effect-free; children without a published child price ride free.
pub fn total(route: &Route, role: UserRole, tenant: &Tenant, adults: u32, children: u32) -> Quote {
    let adult = price_for_user(route, role, tenant);
    let child = child_price(route);
    let sum = f64::from(adults) * adult + f64::from(children) * child.unwrap_or(0.0);

    Quote {
        adult_price: round_money(adult),
        child_price: child.map(round_money),
        adults,
        children,
        total: round_money(sum),
    }
}

/// Distance-based fare for ad-hoc trips booked without a published route.
/// Corporate markup applies on top of the metered amount.
pub fn adhoc_fare(tenant: &Tenant, role: UserRole, pickup: GeoPoint, dropoff: GeoPoint) -> f64 {
    let km = haversine_distance(pickup.lat, pickup.lng, dropoff.lat, dropoff.lng);
    let mut fare = tenant.base_fare + tenant.per_km_rate * km;
    if role == UserRole::CorporateCustomer {
        if let Some(factor) = markup_factor(tenant) {
            fare *= factor;
        }
    }
    round_money(fare)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures;
    use crate::entities::user::UserRole;

    #[tokio::test]
    async fn corporate_markup_applies_per_adult() {
        let world = fixtures::world().await;
        let route = fixtures::scheduled_route(world.tenant.id, 10);

        // base 10.0, markup 20% -> 12.00 per adult
        let quote = total(&route, UserRole::CorporateCustomer, &world.tenant, 2, 0);
        assert_eq!(quote.adult_price, 12.0);
        assert_eq!(quote.total, 24.0);
    }

    #[tokio::test]
    async fn surcharge_model_adds_flat_amount() {
        let world = fixtures::world().await;
        let mut route = fixtures::scheduled_route(world.tenant.id, 10);
        route.surcharges.insert(world.tenant.id, 1.5);

        // Plain customers pay base + surcharge, not the corporate markup.
        assert_eq!(price_for_user(&route, UserRole::Customer, &world.tenant), 11.5);
    }

    #[tokio::test]
    async fn markup_is_clamped_to_hundred_percent() {
        let mut world = fixtures::world().await;
        world.tenant.markup_percent = Some(250.0);
        let route = fixtures::scheduled_route(world.tenant.id, 10);

        assert_eq!(
            price_for_user(&route, UserRole::CorporateCustomer, &world.tenant),
            20.0
        );
    }

    #[tokio::test]
    async fn children_split_uses_child_price_when_present() {
        let world = fixtures::world().await;
        let route = fixtures::scheduled_route(world.tenant.id, 10);

        let quote = total(&route, UserRole::Customer, &world.tenant, 1, 2);
        assert_eq!(quote.total, 10.0 + 2.0 * 6.0);

        let mut free_kids = route.clone();
        free_kids.child_price = None;
        let quote = total(&free_kids, UserRole::Customer, &world.tenant, 1, 2);
        assert_eq!(quote.total, 10.0);
    }

    #[tokio::test]
    async fn quote_is_deterministic() {
        let world = fixtures::world().await;
        let route = fixtures::scheduled_route(world.tenant.id, 10);

        let a = total(&route, UserRole::CorporateCustomer, &world.tenant, 3, 1);
        let b = total(&route, UserRole::CorporateCustomer, &world.tenant, 3, 1);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn adhoc_fare_is_metered_by_distance() {
        let world = fixtures::world().await;
        let pickup = fixtures::CENTER;
        let dropoff = crate::entities::location::GeoPoint {
            lat: pickup.lat + 0.05,
            lng: pickup.lng,
        };

        let fare = adhoc_fare(&world.tenant, UserRole::Customer, pickup, dropoff);
        // ~5.6 km at 1.2/km over a 2.5 flag-fall.
        assert!(fare > world.tenant.base_fare);
        assert!(fare < 12.0);

        let corporate = adhoc_fare(&world.tenant, UserRole::CorporateCustomer, pickup, dropoff);
        assert!(corporate > fare);
    }
}
