use anyhow::{anyhow, Result};
use lapin::{
    options::*, types::FieldTable, BasicProperties, Channel, Connection,
    ConnectionProperties, Consumer,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Clone)]
pub struct RabbitMqService {
    url: String,
    conn: Arc<Mutex<Connection>>,
    channel: Arc<Mutex<Channel>>,
}

impl RabbitMqService {
    async fn connect(url: &str) -> Result<(Connection, Channel)> {
        info!("Connecting to RabbitMQ");
        let conn = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        let channel = conn
            .create_channel()
            .await
            .map_err(|e| anyhow!("Failed to create channel: {}", e))?;

        // Publishes are awaited until the broker confirms them.
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to enable publisher confirms: {}", e))?;

        info!("✅ Connected to RabbitMQ");
        Ok((conn, channel))
    }

    pub async fn new(url: &str) -> Result<Self> {
        let (conn, channel) = Self::connect(url).await?;

        Ok(Self {
            url: url.to_string(),
            conn: Arc::new(Mutex::new(conn)),
            channel: Arc::new(Mutex::new(channel)),
        })
    }

    async fn reconnect(&self) -> Result<()> {
        warn!("RabbitMQ connection dropped, reconnecting...");
        let (conn, channel) = Self::connect(&self.url).await?;
        *self.conn.lock().await = conn;
        *self.channel.lock().await = channel;
        Ok(())
    }

    async fn declare(channel: &Channel, queue: &str) -> Result<()> {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to declare queue {}: {}", queue, e))?;
        Ok(())
    }

    async fn publish_internal(
        &self,
        queue: &str,
        payload: &[u8],
        properties: BasicProperties,
    ) -> Result<()> {
        let channel = self.channel.lock().await;

        Self::declare(&channel, queue).await?;

        let confirmation = channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                properties.with_delivery_mode(2), // Persistent
            )
            .await
            .map_err(|e| anyhow!("Failed to publish message: {}", e))?
            .await
            .map_err(|e| anyhow!("Failed to confirm publication: {}", e))?;

        if confirmation.is_nack() {
            return Err(anyhow!("Broker rejected message for queue {}", queue));
        }

        Ok(())
    }

    /// Publishes a persistent message, reconnecting once if the channel is gone.
    pub async fn publish(
        &self,
        queue: &str,
        payload: &[u8],
        properties: BasicProperties,
    ) -> Result<()> {
        if let Err(e) = self
            .publish_internal(queue, payload, properties.clone())
            .await
        {
            warn!("RabbitMQ publish failed: {}. Retrying after reconnect.", e);
            self.reconnect().await?;
            self.publish_internal(queue, payload, properties).await?;
        }

        Ok(())
    }

    /// Opens a manual-ack consumer on a dedicated channel.
    pub async fn consumer(&self, queue: &str, tag: &str, prefetch: u16) -> Result<Consumer> {
        let channel = {
            let conn = self.conn.lock().await;
            conn.create_channel()
                .await
                .map_err(|e| anyhow!("Failed to create consumer channel: {}", e))?
        };

        Self::declare(&channel, queue).await?;

        channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to set prefetch: {}", e))?;

        let consumer = channel
            .basic_consume(
                queue,
                tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create consumer on {}: {}", queue, e))?;

        Ok(consumer)
    }
}
