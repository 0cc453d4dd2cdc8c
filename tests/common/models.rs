//! Record types shared by the integration tests

use rust_database_models::prelude::*;

/// Fruit kinds, stored as the `fruit` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fruit {
    Apple,
    Orange,
    Banana,
}

impl Fruit {
    pub const ALL: [Fruit; 3] = [Fruit::Apple, Fruit::Orange, Fruit::Banana];

    pub fn as_str(self) -> &'static str {
        match self {
            Fruit::Apple => "apple",
            Fruit::Orange => "orange",
            Fruit::Banana => "banana",
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|fruit| fruit.as_str() == text)
            .ok_or_else(|| DatabaseError::type_mismatch("fruit", text))
    }

    pub fn column_type() -> ColumnType {
        ColumnType::enumeration("fruit", Self::ALL.map(Fruit::as_str))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FruitBasket {
    pub id: Option<i64>,
    pub owner: String,
    pub fruits: Vec<Fruit>,
    pub price: Option<FixedPoint>,
}

impl FruitBasket {
    pub fn new(owner: &str, fruits: &[Fruit]) -> Self {
        Self {
            id: None,
            owner: owner.to_string(),
            fruits: fruits.to_vec(),
            price: None,
        }
    }
}

impl Model for FruitBasket {
    fn describe() -> Result<RecordSchema> {
        RecordSchema::builder("FruitBasket")
            .schema("market")
            .table("fruit_basket")
            .auto_filled("id", ColumnType::serial().primary_key())
            .column("owner", ColumnType::text().not_null())
            .column("fruits", ColumnType::array(Fruit::column_type()))
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

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
}

impl Product {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl Model for Product {
    fn describe() -> Result<RecordSchema> {
        RecordSchema::builder("Product")
            .schema("shop")
            .auto_filled("id", ColumnType::serial().primary_key())
            .column("name", ColumnType::text().not_null())
            .build()
    }

    fn to_record(&self) -> Result<Record> {
        Record::from_values(&Self::schema()?, vec![self.id.into(), self.name.clone().into()])
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.get("id")?,
            name: record.get("name")?,
        })
    }
}

/// An order points at one product and any number of extras
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Option<i64>,
    pub product: Product,
    pub extras: Vec<Product>,
    pub note: Option<String>,
}

impl Model for Order {
    fn describe() -> Result<RecordSchema> {
        let product = Product::schema()?;
        RecordSchema::builder("Order")
            .schema("shop")
            .table("orders")
            .auto_filled("id", ColumnType::serial().primary_key())
            .column("product", ColumnType::foreign_key(&product)?.not_null())
            .column("extras", ColumnType::array(ColumnType::foreign_key(&product)?))
            .column("note", ColumnType::text())
            .build()
    }

    fn to_record(&self) -> Result<Record> {
        let extras = self
            .extras
            .iter()
            .map(|p| p.to_record().map(Value::from))
            .collect::<Result<Vec<_>>>()?;
        Record::from_values(
            &Self::schema()?,
            vec![
                self.id.into(),
                self.product.to_record()?.into(),
                extras.into(),
                self.note.clone().into(),
            ],
        )
    }

    fn from_record(record: &Record) -> Result<Self> {
        let extras = record
            .get::<Option<Vec<Record>>>("extras")?
            .unwrap_or_default()
            .iter()
            .map(Product::from_record)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id: record.get("id")?,
            product: Product::from_record(&record.get::<Record>("product")?)?,
            extras,
            note: record.get("note")?,
        })
    }
}

/// A table without a primary key
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub message: String,
}

impl Model for LogLine {
    fn describe() -> Result<RecordSchema> {
        RecordSchema::builder("LogLine")
            .column("message", ColumnType::text())
            .build()
    }

    fn to_record(&self) -> Result<Record> {
        Record::from_values(&Self::schema()?, vec![self.message.clone().into()])
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            message: record.get("message")?,
        })
    }
}

/// Only an auto-filled key, so inserts carry no values
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: Option<i64>,
}

impl Model for Ticket {
    fn describe() -> Result<RecordSchema> {
        RecordSchema::builder("Ticket")
            .auto_filled("id", ColumnType::serial().primary_key())
            .build()
    }

    fn to_record(&self) -> Result<Record> {
        Record::from_values(&Self::schema()?, vec![self.id.into()])
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.get("id")?,
        })
    }
}

/// Declares two primary keys; registration must fail
#[derive(Debug, Clone)]
pub struct TwoKeys;

impl Model for TwoKeys {
    fn describe() -> Result<RecordSchema> {
        RecordSchema::builder("TwoKeys")
            .column("a", ColumnType::integer().primary_key())
            .column("b", ColumnType::integer().primary_key())
            .build()
    }

    fn to_record(&self) -> Result<Record> {
        Record::from_values(&Self::schema()?, vec![Value::Null, Value::Null])
    }

    fn from_record(_: &Record) -> Result<Self> {
        Ok(TwoKeys)
    }
}

/// `complex (r REAL, i REAL)`
pub fn complex_type() -> ColumnType {
    ColumnType::composite(
        "complex",
        vec![
            Column::new("r", ColumnType::real()),
            Column::new("i", ColumnType::real()),
        ],
    )
}

pub fn complex(r: f64, i: f64) -> Value {
    Value::Composite(vec![Value::Real(r), Value::Real(i)])
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaseSingle {
    pub id: Option<i64>,
    pub a: i32,
}

impl Model for BaseSingle {
    fn describe() -> Result<RecordSchema> {
        RecordSchema::builder("BaseSingle")
            .schema("unittests")
            .table("basesingle")
            .auto_filled("id", ColumnType::serial().primary_key())
            .column("a", ColumnType::integer().not_null())
            .build()
    }

    fn to_record(&self) -> Result<Record> {
        Record::from_values(&Self::schema()?, vec![self.id.into(), self.a.into()])
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.get("id")?,
            a: record.get("a")?,
        })
    }
}

/// Inherits every `BaseSingle` column ahead of its own
#[derive(Debug, Clone, PartialEq)]
pub struct SubSingle {
    pub id: Option<i64>,
    pub a: i32,
    pub b: i32,
}

impl Model for SubSingle {
    fn describe() -> Result<RecordSchema> {
        RecordSchema::builder("SubSingle")
            .schema("unittests")
            .table("subsingle")
            .extends(&*BaseSingle::schema()?)
            .column("b", ColumnType::integer().not_null())
            .build()
    }

    fn to_record(&self) -> Result<Record> {
        Record::from_values(
            &Self::schema()?,
            vec![self.id.into(), self.a.into(), self.b.into()],
        )
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.get("id")?,
            a: record.get("a")?,
            b: record.get("b")?,
        })
    }
}
