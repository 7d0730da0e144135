// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer-facing texts and button layouts.

use flowershop_core::types::{
    CatalogItem, Category, Choice, ChoiceButton, LineItem, Order, OutboundAction, PriceBracket,
};
use flowershop_core::UserId;
use rust_decimal::Decimal;

use crate::catalog::Page;
use crate::session::SessionFields;

/// Price without trailing zeros, e.g. `1500`.
pub fn rub(amount: Decimal) -> String {
    amount.normalize().to_string()
}

fn prompt(user: &UserId, text: impl Into<String>, choices: Vec<Vec<ChoiceButton>>) -> OutboundAction {
    OutboundAction::Prompt {
        user: user.clone(),
        text: text.into(),
        choices,
    }
}

fn button(label: impl Into<String>, choice: Choice) -> Vec<ChoiceButton> {
    vec![ChoiceButton::new(label, choice)]
}

fn to_main_row(label: &str) -> Vec<ChoiceButton> {
    button(label, Choice::ToMain)
}

// --- Consent ---

pub fn welcome(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "Закажите доставку праздничного букета, собранного специально для \
         ваших любимых, родных и коллег.\n\
         Наш букет со смыслом станет главным подарком на вашем празднике!",
    )
}

pub fn consent(user: &UserId, document: &str) -> Vec<OutboundAction> {
    vec![
        OutboundAction::SendDocument {
            user: user.clone(),
            doc_ref: document.to_string(),
        },
        prompt(
            user,
            "Для продолжения необходимо согласие на обработку персональных данных.",
            vec![
                button("Принять", Choice::ConsentAccept),
                button("Отказаться", Choice::ConsentDecline),
            ],
        ),
    ]
}

pub fn consent_declined(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "Без согласия на обработку персональных данных мы не можем оформить заказ. \
         Чтобы начать заново, отправьте /start.",
    )
}

pub fn consent_thanks(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "Спасибо за согласие на обработку данных!")
}

// --- Catalog ---

pub fn occasions(user: &UserId, categories: &[Category]) -> OutboundAction {
    let mut rows: Vec<_> = categories
        .iter()
        .map(|c| button(c.name.clone(), Choice::Occasion(c.id)))
        .collect();
    rows.push(button("Заказать консультацию", Choice::MenuConsult));
    prompt(
        user,
        "Давайте подберем букет.\n\
         К какому событию готовимся? Выберите один из вариантов, либо укажите свой",
        rows,
    )
}

pub fn prices(user: &UserId) -> OutboundAction {
    let mut rows: Vec<_> = PriceBracket::ALL
        .iter()
        .map(|b| button(b.label(), Choice::Price(*b)))
        .collect();
    rows.push(to_main_row("На главную"));
    prompt(user, "На какую сумму рассчитываете?", rows)
}

pub fn no_matches(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "К сожалению, подходящих букетов не найдено.")
}

/// One button per item, then the paging row and the way back.
pub fn item_page(user: &UserId, page: &Page<CatalogItem>) -> OutboundAction {
    if page.items.is_empty() {
        return prompt(
            user,
            "Нет букетов на этой странице.",
            vec![to_main_row("В главное меню")],
        );
    }

    let mut rows: Vec<_> = page
        .items
        .iter()
        .map(|i| button(format!("{} - {}р.", i.name, rub(i.price)), Choice::Item(i.id)))
        .collect();

    let mut nav = Vec::new();
    if page.has_prev() {
        nav.push(ChoiceButton::new("⬅️ Назад", Choice::Page(page.page - 1)));
    }
    if page.has_next() {
        nav.push(ChoiceButton::new("Вперед ➡️", Choice::Page(page.page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(to_main_row("В главное меню"));

    prompt(
        user,
        format!(
            "Доступные букеты:\nСтраница {} из {}",
            page.page, page.total_pages
        ),
        rows,
    )
}

/// Photo, description, and the next-step menu for a selected bouquet.
pub fn item_card(user: &UserId, item: &CatalogItem, photo_fallback: &str) -> Vec<OutboundAction> {
    let photo_ref = item
        .photo
        .clone()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| photo_fallback.to_string());
    vec![
        OutboundAction::SendPhoto {
            user: user.clone(),
            photo_ref,
        },
        prompt(
            user,
            format!(
                "Букет: {}\nОписание: {}\nЦветочный состав: {}\nЦена: {}р.",
                item.name,
                item.description,
                item.structure,
                rub(item.price)
            ),
            vec![
                button("Заказать букет", Choice::MenuOrder),
                button("Заказать консультацию", Choice::MenuConsult),
                button("Посмотреть всю коллекцию", Choice::MenuCollection),
            ],
        ),
    ]
}

pub fn item_unavailable(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "❌ Этот букет больше недоступен. Пожалуйста, выберите другой.",
    )
}

pub fn back_to_catalog(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "Возврат в каталог.")
}

// --- Order details ---

pub fn ask_recipient_name(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "Введите имя получателя:")
}

pub fn ask_address(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "Введите адрес доставки в формате: г. Город, ул. Улица, д. Дом, кв. Квартира\n\
         (например: г. Москва, ул. Ленина, д. 15, кв. 3)",
    )
}

pub fn ask_date(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "Введите дату доставки (ГГГГ-ММ-ДД):")
}

pub fn ask_time(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "Введите время доставки (ЧЧ:ММ):")
}

/// Summary shown right before the invoice.
pub fn order_summary(user: &UserId, fields: &SessionFields, delivery_fee: Decimal) -> OutboundAction {
    let (name, price) = fields
        .item
        .as_ref()
        .map(|i| (i.name.as_str(), i.price))
        .unwrap_or(("", Decimal::ZERO));
    let date = fields
        .delivery_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    OutboundAction::text(
        user,
        format!(
            "Ваш заказ:\n\
             💐 Букет: {name}\n\
             👤 Получатель: {}\n\
             📦 Адрес: {}\n\
             📅 Дата: {date}\n\
             ⏰ Время: {}\n\
             💰 Итого: {}р. (букет {}р. + доставка {}р.)",
            fields.recipient_name.as_deref().unwrap_or_default(),
            fields.address.as_deref().unwrap_or_default(),
            fields.delivery_time.as_deref().unwrap_or_default(),
            rub(price + delivery_fee),
            rub(price),
            rub(delivery_fee),
        ),
    )
}

pub fn invoice(
    user: &UserId,
    item_name: &str,
    line_items: Vec<LineItem>,
    payload_ref: String,
) -> OutboundAction {
    OutboundAction::RequestPayment {
        user: user.clone(),
        title: "Оплата заказа".to_string(),
        description: format!("Букет: {item_name}"),
        line_items,
        payload_ref,
    }
}

pub fn awaiting_payment(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "Ожидаем оплату по выставленному счету. Чтобы изменить заказ, вернитесь в главное меню.",
    )
}

pub fn payment_received(user: &UserId, order: &Order, courier_assigned: bool) -> OutboundAction {
    let mut text = format!(
        "Оплачено: {}р.\n✅ Заказ #{} оформлен! Спасибо за покупку!",
        rub(order.amount_paid),
        order.id
    );
    if courier_assigned {
        text.push_str("\n🚚 Заказ передан курьеру.");
    }
    OutboundAction::text(user, text)
}

pub fn payment_already_counted(user: &UserId, order: &Order) -> OutboundAction {
    OutboundAction::text(
        user,
        format!("Оплата уже учтена, заказ #{} оформлен.", order.id),
    )
}

// --- Consultation ---

pub fn ask_phone(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "📞 Укажите номер телефона (пример: +79161234567 или 89161234567), \
         и наш флорист перезвонит вам в течение 20 минут",
    )
}

pub fn confirm_phone(user: &UserId, phone: &str) -> OutboundAction {
    prompt(
        user,
        format!("📞 Ваш номер телефона - {phone}\nПодтвердите его!"),
        vec![vec![
            ChoiceButton::new("Подтвердить", Choice::PhoneConfirm),
            ChoiceButton::new("Изменить", Choice::PhoneEdit),
        ]],
    )
}

pub fn callback_promised(user: &UserId, phone: &str) -> OutboundAction {
    OutboundAction::text(
        user,
        format!("📞 Ваш номер - {phone}\n👤 Наш флорист перезвонит вам в течение 20 минут"),
    )
}

// --- Session navigation ---

pub fn resume_offer(user: &UserId) -> OutboundAction {
    prompt(
        user,
        "Обнаружен незавершенный диалог. Продолжить?",
        vec![
            button("Продолжить", Choice::Resume),
            button("Начать заново", Choice::Restart),
        ],
    )
}

pub fn use_buttons(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "Пожалуйста, воспользуйтесь кнопками ниже.")
}

pub fn send_start(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "Чтобы начать, отправьте /start.")
}

// --- Failures ---

pub fn could_not_save(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "❌ Не удалось сохранить данные. Пожалуйста, повторите последнее действие.",
    )
}

pub fn incomplete_order(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "❌ Данные заказа неполные. Пожалуйста, проверьте и оформите заказ заново.",
    )
}

pub fn courier_pending(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "Сейчас нет свободных курьеров. Заказ принят, курьер будет назначен вручную.",
    )
}

pub fn florist_pending(user: &UserId) -> OutboundAction {
    OutboundAction::text(
        user,
        "Сейчас нет свободных флористов. Заявка принята, флорист перезвонит, как только освободится.",
    )
}

pub fn generic_failure(user: &UserId) -> OutboundAction {
    OutboundAction::text(user, "❌ Ошибка. Обратитесь в поддержку.")
}
