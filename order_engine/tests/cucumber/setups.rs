use cucumber::given;
use order_engine::db_types::ProductId;

use crate::cucumber::{shop_world::OrderSystem, ShopWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut ShopWorld) {
    let system = OrderSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "product {int} has {int} units in stock")]
async fn stock_product(world: &mut ShopWorld, product_id: i64, quantity: i64) {
    world.system().inventory.restock(ProductId(product_id), quantity).await.expect("Error restocking");
}
