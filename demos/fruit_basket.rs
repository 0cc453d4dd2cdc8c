//! Fruit basket example
//!
//! This example walks through the mapping layer against a PostgreSQL server:
//! - Describing a record type with an enum array and a NUMERIC column
//! - Creating the table and its enum type
//! - Inserting, mutating and fetching records
//!
//! Connection settings come from the usual `PG*` environment variables.
//!
//! Run with: cargo run --example fruit_basket

use rust_database_models::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fruit {
    Apple,
    Orange,
    Banana,
}

impl Fruit {
    const ALL: [Fruit; 3] = [Fruit::Apple, Fruit::Orange, Fruit::Banana];

    fn as_str(self) -> &'static str {
        match self {
            Fruit::Apple => "apple",
            Fruit::Orange => "orange",
            Fruit::Banana => "banana",
        }
    }

    fn parse(text: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|fruit| fruit.as_str() == text)
            .ok_or_else(|| DatabaseError::type_mismatch("fruit", text))
    }
}

#[derive(Debug, Clone)]
struct FruitBasket {
    id: Option<i64>,
    owner: String,
    fruits: Vec<Fruit>,
    price: Option<FixedPoint>,
}

impl Model for FruitBasket {
    fn describe() -> Result<RecordSchema> {
        RecordSchema::builder("FruitBasket")
            .schema("market")
            .table("fruit_basket")
            .auto_filled("id", ColumnType::serial().primary_key())
            .column("owner", ColumnType::text().not_null())
            .column(
                "fruits",
                ColumnType::array(ColumnType::enumeration("fruit", Fruit::ALL.map(Fruit::as_str))),
            )
            .column("price", ColumnType::numeric(8, 2))
            .build()
    }

    fn to_record(&self) -> Result<Record> {
        let fruits: Vec<Value> = self.fruits.iter().map(|f| f.as_str().into()).collect();
        Record::from_values(
            &Self::schema()?,
            vec![
                self.id.into(),
                self.owner.clone().into(),
                fruits.into(),
                self.price.into(),
            ],
        )
    }

    fn from_record(record: &Record) -> Result<Self> {
        let fruits = record
            .get::<Option<Vec<String>>>("fruits")?
            .unwrap_or_default()
            .iter()
            .map(|name| Fruit::parse(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id: record.get("id")?,
            owner: record.get("owner")?,
            fruits,
            price: record.get("price")?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Database Models - Fruit Basket Example ===\n");

    println!("1. Connecting to database...");
    let db = PostgresDatabase::new();
    db.connect(&ConnectionBuilder::from_env()?.build_connection_string())
        .await?;
    println!("   ✓ Connected\n");

    println!("2. Creating table...");
    FruitBasket::create_table(&db, TableOptions::recreate()).await?;
    println!("   ✓ {}\n", FruitBasket::schema()?.qualified_table());

    println!("3. Inserting baskets...");
    for (owner, fruits, price) in [
        ("alice", vec![Fruit::Apple, Fruit::Apple], "4.50"),
        ("bob", vec![Fruit::Orange], "2.25"),
        ("alice", vec![Fruit::Banana, Fruit::Orange], "3.10"),
    ] {
        let mut basket = FruitBasket {
            id: None,
            owner: owner.to_string(),
            fruits,
            price: Some(FixedPoint::parse(price)?),
        };
        basket.insert(&db).await?;
        println!("   ✓ basket {:?} for {}", basket.id, basket.owner);
    }
    println!();

    println!("4. Adding a banana to bob's basket...");
    let mut bobs = FruitBasket::instantiate_one(&db, &Filter::new().where_eq("owner", "bob")).await?;
    mutate(&db, &mut bobs, true, |basket| {
        basket.fruits.push(Fruit::Banana);
        basket.price = basket.price.and_then(|p| p.checked_add(&FixedPoint::from_i64(1)));
        Ok::<_, DatabaseError>(())
    })
    .await?;
    println!("   ✓ {:?}\n", bobs.fruits);

    println!("5. A rejected change leaves the basket as it was...");
    let result = mutate(&db, &mut bobs, true, |basket| {
        basket.fruits.clear();
        Err::<(), _>(DatabaseError::other("baskets are never empty"))
    })
    .await;
    println!("   ✓ {} -> still {:?}\n", result.unwrap_err(), bobs.fruits);

    println!("6. Alice's baskets, newest first...");
    let filter = Filter::new().where_eq("owner", "alice").order_by_desc("id");
    for basket in FruitBasket::fetch_all(&db, &filter).await? {
        let price = basket.price.map(|p| p.to_sql_string()).unwrap_or_default();
        println!("   {:?}: {:?} at {}", basket.id, basket.fruits, price);
    }
    println!();

    println!("7. Cleaning up...");
    let removed = bobs.delete(&db).await?;
    println!("   ✓ removed bob's basket: {}", removed);
    db.disconnect().await?;
    println!("   ✓ Disconnected");

    Ok(())
}
