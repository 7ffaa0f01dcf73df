//! Order creation
//!
//! Checkout turns either an explicit item list (buy now) or the cart into a
//! confirmed order. Buy-now items name catalog products; prices always come
//! from the catalog. Every rule is checked before anything is written, so a
//! rejected checkout leaves the cart and the order history untouched.

use serde::Deserialize;
use tracing::debug;
use validator::Validate;

use crate::domain::aggregates::{
    Cart, CartEntry, CustomerDetails, NewOrder, Order, PaymentMethod, ShippingAddress, UserProfile,
};
use crate::domain::value_objects::ProductId;
use crate::session::Session;
use crate::{MarketplaceError, Result};

/// Where the order ships to.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AddressChoice {
    /// Address saved on the shopper's profile.
    Profile,
    Custom(ShippingAddress),
}

/// One buy-now line.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CheckoutItem {
    pub fn new(product_id: u64, quantity: u32) -> Self { Self { product_id: ProductId(product_id), quantity } }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Buy-now items. When absent the cart is checked out.
    #[serde(default)]
    pub items: Option<Vec<CheckoutItem>>,
    pub address: AddressChoice,
    pub payment: PaymentMethod,
}

#[derive(Clone, Debug)]
pub struct Checkout {
    session: Session,
}

impl Checkout {
    pub fn new(session: Session) -> Self { Self { session } }

    pub async fn place(&self, request: CheckoutRequest) -> Result<Order> {
        let profile = self.session.profiles().require::<UserProfile>().await?;

        let explicit = request.items.filter(|items| !items.is_empty());
        let from_cart = explicit.is_none();
        let items = match explicit {
            Some(items) => self.resolve(&items)?,
            None => self.session.cart().entries().await?.into_iter().filter(|e| !e.quantity.is_zero()).collect(),
        };
        if items.is_empty() {
            return Err(MarketplaceError::EmptyCheckout);
        }

        let payment = validate_payment(request.payment)?;

        let address = match request.address {
            AddressChoice::Profile => profile.shipping_address(),
            AddressChoice::Custom(address) => address,
        }
        .trimmed();
        address.validate()?;

        let settings = self.session.settings();
        let totals = settings.shipping.quote(&items)?;
        debug!(namespace = self.session.namespace(), from_cart, subtotal = %totals.subtotal, shipping = %totals.shipping, "checkout quoted");

        let customer = CustomerDetails { name: profile.name.clone(), phone: address.phone.clone(), user_id: profile.user_id.clone() };
        let checked_out = from_cart.then(|| items.clone());
        let order = Order::create(NewOrder { items, address, payment, totals, customer, delivery_days: settings.delivery_days });
        let order = self.session.orders().place(order).await?;

        if let Some(taken) = checked_out {
            self.session.cart().deduct(&taken).await?;
        }
        Ok(order)
    }

    /// Looks buy-now lines up in the catalog. Repeated ids are merged.
    fn resolve(&self, items: &[CheckoutItem]) -> Result<Vec<CartEntry>> {
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity == 0 {
                return Err(MarketplaceError::invalid("quantity", "quantity_must_be_positive"));
            }
            let product = self.session.catalog().get(item.product_id)
                .ok_or(MarketplaceError::ProductNotFound(item.product_id))?;
            entries.push(CartEntry::new(product.clone(), item.quantity));
        }
        Ok(Cart::from(entries).to_vec())
    }
}

fn validate_payment(payment: PaymentMethod) -> Result<PaymentMethod> {
    match payment {
        PaymentMethod::Upi { upi_id } if upi_id.trim().is_empty() => Err(MarketplaceError::invalid("upi_id", "upi_id_required")),
        PaymentMethod::Upi { upi_id } => Ok(PaymentMethod::Upi { upi_id: upi_id.trim().to_string() }),
        PaymentMethod::Cod => Ok(PaymentMethod::Cod),
    }
}
