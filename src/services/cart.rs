//! Customer cart maintenance.

use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::aggregates::{Cart, CartError, CartItem, CartItemDisplay, CartPricing};
use crate::repository::{Repository, UnitOfWork};
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct CartService {
    repo: Arc<dyn Repository>,
    pricing: CartPricing,
}

impl CartService {
    pub fn new(repo: Arc<dyn Repository>, pricing: CartPricing) -> Self {
        Self { repo, pricing }
    }

    /// The customer's saved cart, if one has been created.
    pub async fn current(&self, customer_id: Uuid) -> Result<Option<Cart>> {
        self.repo.find_cart_for_customer(customer_id).await
    }

    /// An unsaved empty cart carrying the configured pricing.
    pub fn empty_cart(&self, customer_id: Uuid) -> Cart {
        Cart::new(customer_id, self.pricing)
    }

    #[instrument(skip(self))]
    pub async fn add_item(&self, customer_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart> {
        let product = self
            .repo
            .find_product(product_id)
            .await?
            .filter(|p| p.is_purchasable())
            .ok_or(StorefrontError::ProductNotFound)?;
        let store = self.repo.find_store(product.store_id).await?.ok_or(StorefrontError::StoreNotFound)?;
        let item = CartItem {
            product_id: product.id,
            store_id: store.id,
            quantity,
            unit_price: product.price,
            display: CartItemDisplay {
                product_name: product.name,
                product_sku: product.sku,
                product_image: product.image,
                store_name: store.name,
                store_slug: store.slug,
            },
        };

        let mut uow = self.repo.begin().await?;
        lock_customer(uow.as_mut(), customer_id).await?;
        let mut cart = uow.customer_cart_for_update(customer_id).await?.unwrap_or_else(|| self.empty_cart(customer_id));
        cart.reprice(self.pricing);
        cart.add_item(item)?;
        uow.save_cart(&cart).await?;
        uow.commit().await?;
        debug!(cart_id = %cart.id(), items = cart.items().len(), "item added to cart");
        Ok(cart)
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(&self, customer_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart> {
        self.edit(customer_id, |cart| cart.update_quantity(product_id, quantity)).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, customer_id: Uuid, product_id: Uuid) -> Result<Cart> {
        self.edit(customer_id, |cart| cart.remove_item(product_id)).await
    }

    /// Applies `change` to the locked cart and saves it in the same unit of work.
    async fn edit(&self, customer_id: Uuid, change: impl FnOnce(&mut Cart) -> std::result::Result<(), CartError>) -> Result<Cart> {
        let mut uow = self.repo.begin().await?;
        lock_customer(uow.as_mut(), customer_id).await?;
        let mut cart = uow.customer_cart_for_update(customer_id).await?.ok_or(StorefrontError::CartNotFound)?;
        cart.reprice(self.pricing);
        change(&mut cart)?;
        uow.save_cart(&cart).await?;
        uow.commit().await?;
        Ok(cart)
    }
}

/// Checkout locks the customer before the cart; cart edits take the same
/// order, which also keeps two first adds from creating two carts.
async fn lock_customer(uow: &mut dyn UnitOfWork, customer_id: Uuid) -> Result<()> {
    uow.customer(customer_id).await?.ok_or(StorefrontError::CustomerNotFound)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Customer, Product, Store, MAX_LINE_QUANTITY};
    use crate::domain::value_objects::{Money, Sku};
    use crate::repository::MemoryRepository;
    use rust_decimal::Decimal;

    async fn seeded() -> (MemoryRepository, Product, Uuid) {
        let repo = MemoryRepository::new();
        let customer = Customer::register("Chidi Okeke", "chidi@example.com");
        repo.insert_customer(customer.clone()).await;
        let store = Store::create("Mama Put Provisions");
        let mut product = Product::create(store.id, Sku::new("RICE-50KG").unwrap(), "Rice 50kg", Money::naira(65_000));
        product.publish().unwrap();
        repo.insert_store(store).await;
        repo.insert_product(product.clone()).await;
        (repo, product, customer.id)
    }

    #[tokio::test]
    async fn test_add_merges_and_reprices() {
        let (repo, product, customer) = seeded().await;
        let pricing = CartPricing { tax_rate: Decimal::new(75, 3), shipping_fee_per_store: Money::naira(1_000) };
        let carts = CartService::new(Arc::new(repo), pricing);

        carts.add_item(customer, product.id, 1).await.unwrap();
        let cart = carts.add_item(customer, product.id, 2).await.unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.items()[0].display.store_slug, "mama-put-provisions");
        let totals = cart.totals();
        assert_eq!(totals.subtotal, Money::naira(195_000));
        assert_eq!(totals.shipping, Money::naira(1_000));
    }

    #[tokio::test]
    async fn test_hidden_products_cannot_be_added() {
        let (repo, mut product, customer) = seeded().await;
        product.archive();
        repo.insert_product(product.clone()).await;
        let carts = CartService::new(Arc::new(repo), CartPricing::default());
        let result = carts.add_item(customer, product.id, 1).await;
        assert!(matches!(result, Err(StorefrontError::ProductNotFound)));
    }

    #[tokio::test]
    async fn test_unknown_customer_gets_no_cart() {
        let (repo, product, _) = seeded().await;
        let carts = CartService::new(Arc::new(repo.clone()), CartPricing::default());
        let stranger = Uuid::now_v7();
        assert!(matches!(carts.add_item(stranger, product.id, 1).await, Err(StorefrontError::CustomerNotFound)));
        assert!(repo.find_cart_for_customer(stranger).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let (repo, product, customer) = seeded().await;
        let carts = CartService::new(Arc::new(repo), CartPricing::default());

        assert!(matches!(carts.update_quantity(customer, product.id, 2).await, Err(StorefrontError::CartNotFound)));
        carts.add_item(customer, product.id, 1).await.unwrap();
        assert_eq!(carts.update_quantity(customer, product.id, 4).await.unwrap().items()[0].quantity, 4);
        assert!(carts.remove_item(customer, product.id).await.unwrap().is_empty());
        assert!(matches!(
            carts.remove_item(customer, product.id).await,
            Err(StorefrontError::Cart(CartError::ItemNotFound))
        ));
    }

    #[tokio::test]
    async fn test_oversized_quantities_leave_cart_untouched() {
        let (repo, product, customer) = seeded().await;
        let carts = CartService::new(Arc::new(repo.clone()), CartPricing::default());

        assert!(matches!(
            carts.add_item(customer, product.id, 3_000_000_000).await,
            Err(StorefrontError::Cart(CartError::InvalidQuantity))
        ));
        assert!(carts.current(customer).await.unwrap().is_none());

        carts.add_item(customer, product.id, 2).await.unwrap();
        assert!(matches!(
            carts.update_quantity(customer, product.id, MAX_LINE_QUANTITY + 1).await,
            Err(StorefrontError::Cart(CartError::InvalidQuantity))
        ));
        let saved = repo.find_cart_for_customer(customer).await.unwrap().unwrap();
        assert_eq!(saved.items()[0].quantity, 2);
        assert_eq!(saved.totals().item_count, 2);
    }

    #[tokio::test]
    async fn test_current_does_not_create_a_cart() {
        let (repo, _, customer) = seeded().await;
        let carts = CartService::new(Arc::new(repo), CartPricing::default());
        assert!(carts.current(customer).await.unwrap().is_none());
        assert_eq!(carts.empty_cart(customer).customer_id(), customer);
    }
}
