//! Demo catalog data for development and tests.

use common::Money;

use crate::error::Result;
use crate::records::{NewCategory, NewProduct};
use crate::store::CommerceStore;

/// Seeds the demo categories and products.
///
/// Used by the in-memory development server on startup and by tests that
/// need a populated catalog. Safe to call only against an empty catalog.
pub async fn seed_demo_catalog<S: CommerceStore>(store: &S) -> Result<()> {
    let makeup = store
        .insert_category(NewCategory {
            name: "Makeup".into(),
            slug: "makeup".into(),
            description: Some("Premium makeup products, proudly Kenyan".into()),
            image_url: Some("https://images.unsplash.com/photo-1596462502278?w=800".into()),
        })
        .await?;
    let accessories = store
        .insert_category(NewCategory {
            name: "Mobile Accessories".into(),
            slug: "mobile-accessories".into(),
            description: Some("Quality mobile accessories for your devices".into()),
            image_url: Some("https://images.unsplash.com/photo-1505740420928?w=800".into()),
        })
        .await?;
    let clothes = store
        .insert_category(NewCategory {
            name: "Shoes & Clothes".into(),
            slug: "shoes-clothes".into(),
            description: Some("Stylish shoes and clothing for every occasion".into()),
            image_url: Some("https://images.unsplash.com/photo-1460353581641?w=800".into()),
        })
        .await?;

    store
        .insert_product(NewProduct {
            name: "Velvet Matte Lipstick".into(),
            description: Some("Long-lasting matte lipstick with rich, vibrant color.".into()),
            price: Money::from_shillings(1200),
            old_price: Some(Money::from_shillings(1500)),
            category_id: makeup.id,
            image_url: "https://images.unsplash.com/photo-1586495777744?w=500".into(),
            additional_images: vec![
                "https://images.unsplash.com/photo-1631214524020?w=500".into(),
            ],
            stock: 45,
            color_options: vec![
                "Ruby Red".into(),
                "Nude Pink".into(),
                "Berry Wine".into(),
                "Coral Sunset".into(),
            ],
            size_options: vec![],
            is_featured: true,
        })
        .await?;
    store
        .insert_product(NewProduct {
            name: "Radiant Glow Foundation".into(),
            description: Some("Lightweight, buildable coverage foundation with SPF 30.".into()),
            price: Money::from_shillings(2800),
            old_price: Some(Money::from_shillings(3200)),
            category_id: makeup.id,
            image_url: "https://images.unsplash.com/photo-1631730486572?w=500".into(),
            additional_images: vec![],
            stock: 30,
            color_options: vec!["Ivory".into(), "Beige".into(), "Caramel".into()],
            size_options: vec![],
            is_featured: true,
        })
        .await?;
    store
        .insert_product(NewProduct {
            name: "Shimmer Eyeshadow Palette".into(),
            description: Some("12 highly pigmented shades from soft neutrals to metallics.".into()),
            price: Money::from_shillings(2200),
            old_price: Some(Money::from_shillings(2800)),
            category_id: makeup.id,
            image_url: "https://images.unsplash.com/photo-1512496015851?w=500".into(),
            additional_images: vec![],
            stock: 25,
            color_options: vec!["Warm Tones".into(), "Cool Tones".into(), "Smokey".into()],
            size_options: vec![],
            is_featured: false,
        })
        .await?;
    store
        .insert_product(NewProduct {
            name: "Fast-Charge USB-C Cable".into(),
            description: Some("Braided 1.5m cable rated for 60W charging.".into()),
            price: Money::from_shillings(950),
            old_price: None,
            category_id: accessories.id,
            image_url: "https://images.unsplash.com/photo-1583863788434?w=500".into(),
            additional_images: vec![],
            stock: 120,
            color_options: vec!["Black".into(), "White".into()],
            size_options: vec![],
            is_featured: false,
        })
        .await?;
    store
        .insert_product(NewProduct {
            name: "Canvas High-Top Sneakers".into(),
            description: Some("Everyday high-tops with a cushioned insole.".into()),
            price: Money::from_shillings(3500),
            old_price: Some(Money::from_shillings(4200)),
            category_id: clothes.id,
            image_url: "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=500".into(),
            additional_images: vec![],
            stock: 40,
            color_options: vec!["Black".into(), "Red".into()],
            size_options: vec!["39".into(), "40".into(), "41".into(), "42".into(), "43".into()],
            is_featured: true,
        })
        .await?;

    Ok(())
}
