use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use testresult::TestResult;

use areca_market::checkout::{AddressChoice, CheckoutItem, CheckoutRequest};
use areca_market::domain::aggregates::{
    Cart, OrderError, OrderStatus, PaymentMethod, ProductSnapshot, Role, ShippingAddress, UserProfile,
    UserRegistration, WishlistOutcome,
};
use areca_market::domain::value_objects::{Money, ProductId};
use areca_market::events::EventPublisher;
use areca_market::session::{Marketplace, Session, StoreSettings};
use areca_market::storage::{keys, KeyValueStore, MemoryStore, Precondition, StorageError, Versioned};
use areca_market::MarketplaceError;

fn marketplace_with(store: Arc<dyn KeyValueStore>) -> Marketplace {
    Marketplace::new(store, StoreSettings::default(), EventPublisher::disabled())
}

fn marketplace() -> Marketplace { marketplace_with(Arc::new(MemoryStore::new())) }

fn product(id: u64, price: i64) -> ProductSnapshot { ProductSnapshot::new(id, format!("Product {id}"), Money::inr(price)) }

fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha".into(), phone: "9876543210".into(), address: "12 Market St".into(),
        city: "Mangaluru".into(), state: "Karnataka".into(), pincode: "575001".into(),
    }
}

async fn shopper(market: &Marketplace) -> Result<Session, MarketplaceError> {
    let session = market.session(Marketplace::new_session_id());
    let reg = UserRegistration { name: "Asha".into(), contact: "asha@example.com".into(), otp: "123456".into() };
    session.profiles().register_user(reg).await?;
    Ok(session)
}

#[tokio::test]
async fn test_wishlist_add_is_idempotent() -> TestResult {
    let session = marketplace().session("s1");
    let wishlist = session.wishlist();
    assert_eq!(wishlist.add(product(3, 1299)).await?, WishlistOutcome::Added);
    assert_eq!(wishlist.add(product(3, 1299)).await?, WishlistOutcome::AlreadyPresent);
    assert_eq!(wishlist.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cart_add_twice_then_zero_removes() -> TestResult {
    let cart = marketplace().session("s1").cart();
    cart.add(product(1, 299)).await?;
    cart.add(product(1, 299)).await?;
    let entries = cart.entries().await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].quantity.value(), 2);

    cart.update_quantity(ProductId(1), 0).await?;
    assert!(cart.entries().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_shipping_rules_on_checkout() -> TestResult {
    let market = marketplace();
    let session = shopper(&market).await?;

    let below = CheckoutRequest {
        items: Some(vec![CheckoutItem::new(1, 1)]),
        address: AddressChoice::Custom(address()),
        payment: PaymentMethod::Cod,
    };
    let order = session.checkout().place(below).await?;
    assert_eq!(order.shipping(), &Money::inr(40));
    assert_eq!(order.total(), &Money::inr(339));

    let above = CheckoutRequest {
        items: Some(vec![CheckoutItem::new(4, 3)]),
        address: AddressChoice::Custom(address()),
        payment: PaymentMethod::Upi { upi_id: "asha@upi".into() },
    };
    let order = session.checkout().place(above).await?;
    assert_eq!(order.subtotal(), &Money::inr(537));
    assert!(order.shipping().is_zero());
    assert_eq!(order.total(), &Money::inr(537));
    Ok(())
}

#[tokio::test]
async fn test_incomplete_address_creates_no_order() -> TestResult {
    let market = marketplace();
    let session = shopper(&market).await?;
    session.cart().add(product(1, 299)).await?;

    let mut incomplete = address();
    incomplete.pincode = "   ".into();
    let request = CheckoutRequest { items: None, address: AddressChoice::Custom(incomplete), payment: PaymentMethod::Cod };
    let err = session.checkout().place(request).await.unwrap_err();

    assert!(matches!(err, MarketplaceError::Validation(_)));
    assert!(session.orders().list().await?.is_empty());
    assert!(session.orders().last_placed().await?.is_none());
    assert_eq!(session.cart().entries().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cancellation_rules() -> TestResult {
    let market = marketplace();
    let session = shopper(&market).await?;
    let orders = session.orders();
    let buy = || CheckoutRequest {
        items: Some(vec![CheckoutItem::new(4, 1)]),
        address: AddressChoice::Custom(address()),
        payment: PaymentMethod::Cod,
    };

    let shipped = session.checkout().place(buy()).await?;
    for status in [OrderStatus::Processing, OrderStatus::Packed, OrderStatus::Shipped] {
        orders.advance(shipped.id(), status).await?;
    }
    let err = orders.cancel(shipped.id()).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::Order(OrderError::CannotCancel { status: OrderStatus::Shipped, .. })));
    assert_eq!(orders.get(shipped.id()).await?.status(), OrderStatus::Shipped);

    let processing = session.checkout().place(buy()).await?;
    orders.advance(processing.id(), OrderStatus::Processing).await?;
    orders.cancel(processing.id()).await?;

    let reloaded = market.session(session.namespace()).orders().get(processing.id()).await?;
    assert_eq!(reloaded.status(), OrderStatus::Cancelled);
    assert_eq!(reloaded.tracking_steps().last().map(|s| s.status), Some(OrderStatus::Cancelled));
    Ok(())
}

#[tokio::test]
async fn test_buy_now_keeps_cart_and_cart_checkout_clears_it() -> TestResult {
    let market = marketplace();
    let session = shopper(&market).await?;
    session.cart().add(product(1, 299)).await?;
    session.cart().add(product(6, 149)).await?;

    let buy_now = CheckoutRequest {
        items: Some(vec![CheckoutItem::new(3, 1)]),
        address: AddressChoice::Custom(address()),
        payment: PaymentMethod::Cod,
    };
    session.checkout().place(buy_now).await?;
    assert_eq!(session.cart().entries().await?.len(), 2);

    let from_cart = CheckoutRequest { items: None, address: AddressChoice::Custom(address()), payment: PaymentMethod::Cod };
    let order = session.checkout().place(from_cart).await?;
    assert_eq!(order.items().len(), 2);
    assert_eq!(order.subtotal(), &Money::inr(448));
    assert!(session.cart().entries().await?.is_empty());

    let history = session.orders().list().await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id(), order.id());
    Ok(())
}

#[tokio::test]
async fn test_order_transitions_cannot_skip() -> TestResult {
    let market = marketplace();
    let session = shopper(&market).await?;
    let request = CheckoutRequest {
        items: Some(vec![CheckoutItem::new(1, 1)]),
        address: AddressChoice::Custom(address()),
        payment: PaymentMethod::Cod,
    };
    let order = session.checkout().place(request).await?;
    let err = session.orders().advance(order.id(), OrderStatus::Delivered).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::Order(OrderError::InvalidTransition { .. })));
    Ok(())
}

#[tokio::test]
async fn test_profile_gating_per_role() -> TestResult {
    let market = marketplace();
    let session = market.session("s1");
    let err = session.profiles().require::<UserProfile>().await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ProfileRequired(Role::User)));

    let session = shopper(&market).await?;
    assert_eq!(session.profiles().require::<UserProfile>().await?.user_id, "AU_1");
    Ok(())
}

#[tokio::test]
async fn test_sessions_are_isolated() -> TestResult {
    let market = marketplace();
    market.session("a").cart().add(product(1, 299)).await?;
    assert!(market.session("b").cart().entries().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_corrupt_cart_is_reported() -> TestResult {
    let store = Arc::new(MemoryStore::new());
    store.put("s1", keys::CART, serde_json::json!("not a cart"), Precondition::Any).await?;
    let err = marketplace_with(store).session("s1").cart().entries().await.unwrap_err();
    assert!(matches!(err, MarketplaceError::Storage(StorageError::Corrupt { .. })));
    Ok(())
}

/// Adds a product to the cart behind the caller's back, just before the
/// first write to `trigger`.
struct InterleavingStore {
    inner: MemoryStore,
    trigger: &'static str,
    competitor: ProductSnapshot,
    interleaved: AtomicBool,
}

impl InterleavingStore {
    fn new(trigger: &'static str, competitor: ProductSnapshot) -> Self {
        Self { inner: MemoryStore::new(), trigger, competitor, interleaved: AtomicBool::new(false) }
    }

    async fn sneak_into_cart(&self, namespace: &str) -> Result<(), StorageError> {
        let current = self.inner.get(namespace, keys::CART).await?;
        let mut cart: Cart = match current {
            Some(versioned) => serde_json::from_value(versioned.value)
                .map_err(|source| StorageError::Corrupt { key: keys::CART.into(), source })?,
            None => Cart::default(),
        };
        cart.add_item(self.competitor.clone());
        let value = serde_json::to_value(&cart).map_err(|source| StorageError::Encode { key: keys::CART.into(), source })?;
        self.inner.put(namespace, keys::CART, value, Precondition::Any).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InterleavingStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Versioned>, StorageError> {
        self.inner.get(namespace, key).await
    }

    async fn put(&self, namespace: &str, key: &str, value: serde_json::Value, precondition: Precondition) -> Result<u64, StorageError> {
        if key == self.trigger && !self.interleaved.swap(true, Ordering::SeqCst) {
            self.sneak_into_cart(namespace).await?;
        }
        self.inner.put(namespace, key, value, precondition).await
    }

    async fn delete(&self, namespace: &str, key: &str, precondition: Precondition) -> Result<(), StorageError> {
        self.inner.delete(namespace, key, precondition).await
    }
}

#[tokio::test]
async fn test_concurrent_cart_write_is_not_lost() -> TestResult {
    let store = Arc::new(InterleavingStore::new(keys::CART, product(6, 149)));
    let cart = marketplace_with(store).session("s1").cart();
    cart.add(product(1, 299)).await?;

    let ids: Vec<u64> = cart.entries().await?.iter().map(|e| e.id().0).collect();
    assert_eq!(ids, vec![1, 6]);
    Ok(())
}

#[tokio::test]
async fn test_cart_checkout_keeps_items_added_meanwhile() -> TestResult {
    let store = Arc::new(InterleavingStore::new(keys::ORDERS, product(6, 149)));
    let market = marketplace_with(store);
    let session = shopper(&market).await?;
    session.cart().add(product(1, 299)).await?;

    let request = CheckoutRequest { items: None, address: AddressChoice::Custom(address()), payment: PaymentMethod::Cod };
    let order = session.checkout().place(request).await?;

    let ordered: Vec<u64> = order.items().iter().map(|item| item.product.id.0).collect();
    assert_eq!(ordered, vec![1]);
    let left: Vec<u64> = session.cart().entries().await?.iter().map(|e| e.id().0).collect();
    assert_eq!(left, vec![6]);
    Ok(())
}
