//! # Directory Repositories
//!
//! Suppliers, chicken types and employees: the reference data every ledger
//! entry points at.
//!
//! Chicken types are addressed either by id or by their unique name
//! ([`ChickenTypeRef`]); [`resolve_chicken_type`] handles both inside a
//! caller's transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use roost_core::validation::{validate_amount, validate_count, validate_id, validate_name};
use roost_core::{
    ChickenType, ChickenTypeRef, Employee, Money, NewChickenType, NewEmployee, NewSupplier,
    Supplier,
};

use super::generate_id;
use crate::error::{DbError, DbResult};

const CHICKEN_TYPE_COLUMNS: &str = "id, tenant_id, name, price_cents, stock, created_at, updated_at";
const SUPPLIER_COLUMNS: &str = "id, tenant_id, name, phone, address, created_at, updated_at";
const EMPLOYEE_COLUMNS: &str = "id, tenant_id, name, phone, created_at, updated_at";

// =============================================================================
// Chicken Types
// =============================================================================

/// Repository for chicken types.
#[derive(Debug, Clone)]
pub struct ChickenTypeRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ChickenTypeRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        ChickenTypeRepository { pool, tenant_id }
    }

    /// Creates a chicken type. Names are unique per tenant.
    pub async fn create(&self, input: NewChickenType) -> DbResult<ChickenType> {
        let name = input.name.trim().to_string();
        validate_name("name", &name)?;
        validate_amount("price", input.price)?;
        validate_count("stock", input.stock)?;

        let now = Utc::now();
        let chicken_type = ChickenType {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            name,
            price_cents: input.price.cents(),
            stock: input.stock,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %chicken_type.id, name = %chicken_type.name, "Creating chicken type");

        sqlx::query(
            r#"
            INSERT INTO chicken_types (id, tenant_id, name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&chicken_type.id)
        .bind(&chicken_type.tenant_id)
        .bind(&chicken_type.name)
        .bind(chicken_type.price_cents)
        .bind(chicken_type.stock)
        .bind(chicken_type.created_at)
        .bind(chicken_type.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &chicken_type.name),
            other => other,
        })?;

        info!(id = %chicken_type.id, name = %chicken_type.name, "Chicken type created");
        Ok(chicken_type)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ChickenType>> {
        let sql = format!(
            "SELECT {CHICKEN_TYPE_COLUMNS} FROM chicken_types WHERE tenant_id = ?1 AND id = ?2"
        );
        let row = sqlx::query_as::<_, ChickenType>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list(&self) -> DbResult<Vec<ChickenType>> {
        let sql = format!(
            "SELECT {CHICKEN_TYPE_COLUMNS} FROM chicken_types WHERE tenant_id = ?1 ORDER BY name"
        );
        let rows = sqlx::query_as::<_, ChickenType>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Resolves a reference by id or by name.
    pub async fn resolve(&self, reference: &ChickenTypeRef) -> DbResult<ChickenType> {
        let mut conn = self.pool.acquire().await?;
        resolve_chicken_type(&mut conn, &self.tenant_id, reference).await
    }

    /// Sets the current price. Waste is always costed at the current price.
    pub async fn update_price(&self, id: &str, price: Money) -> DbResult<ChickenType> {
        validate_id("chicken_type_id", id)?;
        validate_amount("price", price)?;

        let result = sqlx::query(
            "UPDATE chicken_types SET price_cents = ?1, updated_at = ?2 WHERE tenant_id = ?3 AND id = ?4",
        )
        .bind(price.cents())
        .bind(Utc::now())
        .bind(&self.tenant_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ChickenType", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("ChickenType", id))
    }
}

/// Finds a chicken type by id or name within `conn`'s transaction.
pub(crate) async fn resolve_chicken_type(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    reference: &ChickenTypeRef,
) -> DbResult<ChickenType> {
    let row = match reference {
        ChickenTypeRef::ById(id) => {
            validate_id("chicken_type_id", id)?;
            let sql = format!(
                "SELECT {CHICKEN_TYPE_COLUMNS} FROM chicken_types WHERE tenant_id = ?1 AND id = ?2"
            );
            sqlx::query_as::<_, ChickenType>(&sql)
                .bind(tenant_id)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
        }
        ChickenTypeRef::ByName(name) => {
            let name = name.trim();
            validate_name("chicken_type", name)?;
            let sql = format!(
                "SELECT {CHICKEN_TYPE_COLUMNS} FROM chicken_types WHERE tenant_id = ?1 AND name = ?2"
            );
            sqlx::query_as::<_, ChickenType>(&sql)
                .bind(tenant_id)
                .bind(name)
                .fetch_optional(&mut *conn)
                .await?
        }
    };

    row.ok_or_else(|| DbError::not_found("ChickenType", reference.to_string()))
}

/// Moves a chicken type's stock counter by `delta`. Not clamped.
pub(crate) async fn adjust_chicken_stock(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    chicken_type_id: &str,
    delta: i64,
) -> DbResult<()> {
    if delta == 0 {
        return Ok(());
    }

    debug!(chicken_type_id = %chicken_type_id, delta, "Adjusting chicken type stock");

    let result = sqlx::query(
        "UPDATE chicken_types SET stock = stock + ?1, updated_at = ?2 WHERE tenant_id = ?3 AND id = ?4",
    )
    .bind(delta)
    .bind(Utc::now())
    .bind(tenant_id)
    .bind(chicken_type_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("ChickenType", chicken_type_id));
    }
    Ok(())
}

// =============================================================================
// Suppliers
// =============================================================================

/// Repository for suppliers.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        SupplierRepository { pool, tenant_id }
    }

    pub async fn create(&self, input: NewSupplier) -> DbResult<Supplier> {
        let name = input.name.trim().to_string();
        validate_name("name", &name)?;

        let now = Utc::now();
        let supplier = Supplier {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            name,
            phone: input.phone,
            address: input.address,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, tenant_id, name, phone, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.tenant_id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE tenant_id = ?1 AND id = ?2");
        let row = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE tenant_id = ?1 ORDER BY name");
        let rows = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

pub(crate) async fn fetch_supplier(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Supplier> {
    validate_id("supplier_id", id)?;
    let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE tenant_id = ?1 AND id = ?2");
    sqlx::query_as::<_, Supplier>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", id))
}

// =============================================================================
// Employees
// =============================================================================

/// Repository for staff members.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        EmployeeRepository { pool, tenant_id }
    }

    pub async fn create(&self, input: NewEmployee) -> DbResult<Employee> {
        let name = input.name.trim().to_string();
        validate_name("name", &name)?;

        let now = Utc::now();
        let employee = Employee {
            id: generate_id(),
            tenant_id: self.tenant_id.clone(),
            name,
            phone: input.phone,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO employees (id, tenant_id, name, phone, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.tenant_id)
        .bind(&employee.name)
        .bind(&employee.phone)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %employee.id, "Employee created");
        Ok(employee)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE tenant_id = ?1 AND id = ?2");
        let row = sqlx::query_as::<_, Employee>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list(&self) -> DbResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE tenant_id = ?1 ORDER BY name");
        let rows = sqlx::query_as::<_, Employee>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

pub(crate) async fn fetch_employee(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Employee> {
    validate_id("employee_id", id)?;
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE tenant_id = ?1 AND id = ?2");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Employee", id))
}
