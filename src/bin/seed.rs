//! Seeds the demo dataset (employees, products, sales) into PostgreSQL.
//! Safe to re-run: tables are created if missing and only filled when empty.

use tokio_postgres::NoTls;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set to seed data")?;

    info!("Starting database seed...");

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;
    let connection_task = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("connection error: {}", e);
        }
    });

    client
        .batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS employees (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                position TEXT NOT NULL,
                department TEXT NOT NULL,
                salary INTEGER NOT NULL,
                hire_date TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS products (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                price REAL NOT NULL,
                stock INTEGER NOT NULL,
                supplier TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sales (
                id SERIAL PRIMARY KEY,
                product_id INTEGER NOT NULL REFERENCES products(id),
                quantity INTEGER NOT NULL,
                sale_date TEXT NOT NULL,
                customer_name TEXT NOT NULL,
                total_amount REAL NOT NULL
            );
            "#,
        )
        .await?;

    let employees_count: i64 = client
        .query_one("SELECT COUNT(*) FROM employees", &[])
        .await?
        .get(0);

    if employees_count == 0 {
        info!("Seeding employees...");
        let employees: [(&str, &str, &str, i32, &str); 8] = [
            ("Иванов Иван", "Разработчик", "IT", 120_000, "2022-01-15"),
            ("Петрова Мария", "Менеджер", "Продажи", 90_000, "2021-06-20"),
            ("Сидоров Петр", "Дизайнер", "Маркетинг", 85_000, "2022-03-10"),
            ("Козлова Анна", "HR специалист", "HR", 75_000, "2021-09-05"),
            ("Николаев Алексей", "Тимлид", "IT", 150_000, "2020-11-12"),
            ("Федорова Елена", "Аналитик", "Аналитика", 95_000, "2022-02-28"),
            ("Морозов Дмитрий", "Разработчик", "IT", 110_000, "2022-07-01"),
            (
                "Васильева Ольга",
                "Менеджер проектов",
                "Управление",
                130_000,
                "2021-04-15",
            ),
        ];
        for (name, position, department, salary, hire_date) in employees {
            client
                .execute(
                    "INSERT INTO employees (name, position, department, salary, hire_date) \
                     VALUES ($1, $2, $3, $4, $5)",
                    &[&name, &position, &department, &salary, &hire_date],
                )
                .await?;
        }
    }

    let products_count: i64 = client
        .query_one("SELECT COUNT(*) FROM products", &[])
        .await?
        .get(0);

    if products_count == 0 {
        info!("Seeding products...");
        let products: [(&str, &str, f32, i32, &str); 8] = [
            ("Ноутбук Dell XPS", "Электроника", 89_999.99, 15, "Dell Inc."),
            ("Смартфон iPhone 14", "Электроника", 79_999.0, 25, "Apple Inc."),
            ("Клавиатура механическая", "Аксессуары", 5_499.0, 50, "Logitech"),
            ("Мышь беспроводная", "Аксессуары", 2_199.0, 100, "Logitech"),
            ("Монитор Samsung 27", "Электроника", 24_999.0, 20, "Samsung"),
            ("Наушники Sony WH-1000XM5", "Аксессуары", 29_999.0, 30, "Sony"),
            ("Планшет iPad Air", "Электроника", 54_999.0, 18, "Apple Inc."),
            ("Веб-камера Logitech", "Аксессуары", 7_999.0, 40, "Logitech"),
        ];
        for (name, category, price, stock, supplier) in products {
            client
                .execute(
                    "INSERT INTO products (name, category, price, stock, supplier) \
                     VALUES ($1, $2, $3, $4, $5)",
                    &[&name, &category, &price, &stock, &supplier],
                )
                .await?;
        }
    }

    let sales_count: i64 = client
        .query_one("SELECT COUNT(*) FROM sales", &[])
        .await?
        .get(0);

    if sales_count == 0 {
        info!("Seeding sales...");
        let sales: [(i32, i32, &str, &str, f32); 8] = [
            (1, 2, "2024-01-15", "ООО Техно", 179_999.98),
            (2, 5, "2024-01-20", "ИП Смирнов", 399_995.0),
            (3, 10, "2024-02-05", "ООО Офис Плюс", 54_990.0),
            (4, 15, "2024-02-10", "ООО Офис Плюс", 32_985.0),
            (5, 3, "2024-02-18", "ИП Петров", 74_997.0),
            (6, 7, "2024-03-01", "ООО Музыка", 209_993.0),
            (1, 1, "2024-03-12", "ИП Иванов", 89_999.99),
            (7, 4, "2024-03-25", "ООО Образование", 219_996.0),
        ];
        for (product_id, quantity, sale_date, customer_name, total_amount) in sales {
            client
                .execute(
                    "INSERT INTO sales (product_id, quantity, sale_date, customer_name, total_amount) \
                     VALUES ($1, $2, $3, $4, $5)",
                    &[&product_id, &quantity, &sale_date, &customer_name, &total_amount],
                )
                .await?;
        }
    }

    info!("Database seeded successfully!");
    drop(client);
    connection_task.abort();
    Ok(())
}
